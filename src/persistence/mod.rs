use crate::project::{ProjectId, ProjectSnapshot};
use crate::recalculation::AuditRecord;
use serde_json::Error as SerdeJsonError;
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable sink for committed project state.
///
/// `commit` must store the snapshot and the audit record together or not at
/// all; the engine treats any error as "nothing was written".
pub trait ProjectStore: Send + Sync {
    fn commit(&self, snapshot: &ProjectSnapshot, audit: &AuditRecord) -> PersistenceResult<()>;
    fn load(&self, project_id: ProjectId) -> PersistenceResult<Option<ProjectSnapshot>>;
}

/// Structural checks on a snapshot read back from storage.
pub fn validate_snapshot(snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
    let mut node_ids = HashSet::with_capacity(snapshot.nodes.len());
    for node in &snapshot.nodes {
        if node.duration < 0 {
            return Err(PersistenceError::InvalidData(format!(
                "node {} has negative duration {}",
                node.id, node.duration
            )));
        }
        if !node_ids.insert(node.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate node id {}",
                node.id
            )));
        }
    }
    for edge in &snapshot.edges {
        if !node_ids.contains(&edge.predecessor) || !node_ids.contains(&edge.successor) {
            return Err(PersistenceError::InvalidData(format!(
                "edge {} references a missing node",
                edge.key()
            )));
        }
    }
    for fact in &snapshot.facts {
        if !node_ids.contains(&fact.fact_id) {
            return Err(PersistenceError::InvalidData(format!(
                "allocation inputs reference missing node {}",
                fact.fact_id
            )));
        }
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_snapshot_from_json, save_snapshot_to_json};
pub use memory::MemoryProjectStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProjectStore;
