pub mod calculations;
pub mod calendar;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod node;
pub mod node_validation;
pub mod scheduler;

pub use calendar::{PeriodCalendar, PeriodUnit};
pub use error::{CycleDetectedError, GraphError, SettingsError};
pub use graph::{ProjectGraph, TopologicalOrder};
pub use metadata::ProjectSettings;
pub use node::{
    ComputedDates, DependencyEdge, EdgeKey, NodeId, NodeKind, Period, RelationKind, ScheduleNode,
};
pub use scheduler::{
    BaselineInfeasibleWarning, CpmScheduler, NodeSchedule, ScheduleResult, ScheduleSummary,
    ScheduleWarning,
};
