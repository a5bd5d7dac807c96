pub mod config;
pub mod logging;
pub mod persistence;
pub mod project;
pub mod recalculation;

pub use config::{ConfigError, EngineConfig};
pub use persistence::{MemoryProjectStore, PersistenceError, ProjectStore};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteProjectStore;
pub use project::{AllocationInputs, FactInputs, ProjectId, ProjectLoad, ProjectSnapshot};
pub use recalculation::{
    AuditRecord, FactAllocation, Mutation, RecalculationError, RecalculationResult, TimelineEngine,
};

pub use timeline_core;
pub use timeline_cost;
