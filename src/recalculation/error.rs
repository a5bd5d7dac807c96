use crate::persistence::PersistenceError;
use crate::project::ProjectId;
use thiserror::Error;
use timeline_core::{CycleDetectedError, GraphError, NodeId, SettingsError};
use timeline_cost::{AllocationError, CurveError};

#[derive(Debug, Error)]
pub enum RecalculationError {
    #[error("project {0} is not loaded")]
    UnknownProject(ProjectId),
    #[error("project {0} is already loaded")]
    ProjectExists(ProjectId),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    CycleDetected(#[from] CycleDetectedError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("fact {fact_id}: {reason}")]
    InvalidFact { fact_id: NodeId, reason: String },
    #[error("recalculation deadline expired during {phase}")]
    Timeout { phase: &'static str },
    #[error("commit failed: {0}")]
    Commit(#[from] PersistenceError),
}

impl RecalculationError {
    /// Timeouts and commit failures leave state untouched and may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecalculationError::Timeout { .. } | RecalculationError::Commit(_)
        )
    }

    pub fn cycle(&self) -> Option<&CycleDetectedError> {
        match self {
            RecalculationError::CycleDetected(err) => Some(err),
            _ => None,
        }
    }
}
