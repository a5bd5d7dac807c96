pub mod allocator;
pub mod catalog;
pub mod curve;
pub mod error;
pub mod money;

pub use allocator::{AllocationRow, PARTS_PER_WHOLE, PeriodAllocator, period_count_for};
pub use catalog::CurveCatalog;
pub use curve::{ControlPoint, ControlPoints, CurveDefinition, CurveProfile, CurveShape, Steepness};
pub use error::{AllocationError, CurveError};
pub use money::{MINOR_UNITS_PER_MAJOR, Money};
