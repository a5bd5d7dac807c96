use crate::node::{EdgeKey, NodeId, Period};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("node {node_id} is referenced by {edge_count} edge(s)")]
    NodeInUse { node_id: NodeId, edge_count: usize },
    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeKey),
    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeKey),
    #[error("invalid node: {0}")]
    InvalidNode(String),
    #[error("computed dates for node {0} overflow the period range")]
    PeriodOverflow(NodeId),
}

/// Raised when the dependency edges do not form a DAG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle detected: {}", format_cycle(.offending_edges))]
pub struct CycleDetectedError {
    /// Edges of one cycle in traversal order; the closing edge comes last.
    pub offending_edges: Vec<EdgeKey>,
}

impl CycleDetectedError {
    pub fn contains(&self, predecessor: NodeId, successor: NodeId) -> bool {
        self.offending_edges
            .contains(&EdgeKey::new(predecessor, successor))
    }
}

fn format_cycle(edges: &[EdgeKey]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("finish constraint {finish} precedes project start {start}")]
    FinishBeforeStart { start: Period, finish: Period },
}
