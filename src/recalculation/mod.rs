//! Applies host edits to a project as one atomic unit of work: mutate a copy,
//! cycle-check, schedule, regenerate affected allocations, commit, then swap
//! the copy in and append an audit record.

pub mod audit;
pub mod engine;
pub mod error;
mod model;
pub mod mutation;

pub use audit::AuditRecord;
pub use engine::{FactAllocation, RecalculationResult, TimelineEngine};
pub use error::RecalculationError;
pub use mutation::Mutation;
