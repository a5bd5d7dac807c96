pub mod cycle;
pub mod project_graph;

pub use cycle::{TopologicalOrder, validate};
pub use project_graph::ProjectGraph;
