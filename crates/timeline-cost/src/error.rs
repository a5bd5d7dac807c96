use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("curve profile '{0}' is not in the catalog")]
    UnknownProfile(String),
    #[error("curve profile '{0}' is defined more than once")]
    DuplicateProfile(String),
    #[error("curve '{id}' needs at least two control points (got {count})")]
    TooFewPoints { id: String, count: usize },
    #[error("curve '{id}' control point {index} is not finite or lies outside its bounds")]
    OutOfRange { id: String, index: usize },
    #[error("curve '{id}' must start at (0.0, 0) and end at (1.0, 100)")]
    OpenEnds { id: String },
    #[error("curve '{id}' period fractions must strictly increase (control point {index})")]
    NonIncreasingFraction { id: String, index: usize },
    #[error("curve '{id}' cumulative percent decreases at control point {index}")]
    DecreasingPercent { id: String, index: usize },
    #[error("steepness {0} is outside 0..=100")]
    InvalidSteepness(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("period count {0} is too large to allocate")]
    PeriodCountTooLarge(i64),
}
