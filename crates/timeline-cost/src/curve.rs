//! Cumulative spend curves.
//!
//! A curve maps elapsed fraction of a timeline (0.0..=1.0) to the cumulative
//! percent of a total spent by then (0..=100). Shapes form a closed set; host
//! supplied shapes enter as [`CurveShape::Custom`] only after their control
//! points pass validation, so sampling never sees a malformed sequence.

use crate::error::CurveError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub fraction: f64,
    pub percent: f64,
}

const fn cp(fraction: f64, percent: f64) -> ControlPoint {
    ControlPoint { fraction, percent }
}

const LINEAR_POINTS: [ControlPoint; 2] = [cp(0.0, 0.0), cp(1.0, 100.0)];

const FRONT_LOADED_POINTS: [ControlPoint; 11] = [
    cp(0.0, 0.0),
    cp(0.1, 20.0),
    cp(0.2, 36.0),
    cp(0.3, 50.0),
    cp(0.4, 62.0),
    cp(0.5, 72.0),
    cp(0.6, 80.0),
    cp(0.7, 87.0),
    cp(0.8, 93.0),
    cp(0.9, 97.0),
    cp(1.0, 100.0),
];

const BACK_LOADED_POINTS: [ControlPoint; 11] = [
    cp(0.0, 0.0),
    cp(0.1, 3.0),
    cp(0.2, 7.0),
    cp(0.3, 13.0),
    cp(0.4, 20.0),
    cp(0.5, 28.0),
    cp(0.6, 38.0),
    cp(0.7, 50.0),
    cp(0.8, 64.0),
    cp(0.9, 80.0),
    cp(1.0, 100.0),
];

const BELL_POINTS: [ControlPoint; 11] = [
    cp(0.0, 0.0),
    cp(0.1, 2.0),
    cp(0.2, 6.0),
    cp(0.3, 14.0),
    cp(0.4, 28.0),
    cp(0.5, 50.0),
    cp(0.6, 72.0),
    cp(0.7, 86.0),
    cp(0.8, 94.0),
    cp(0.9, 98.0),
    cp(1.0, 100.0),
];

/// Control points that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPoints(Vec<ControlPoint>);

impl ControlPoints {
    pub fn new(id: &str, points: Vec<ControlPoint>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints {
                id: id.to_string(),
                count: points.len(),
            });
        }
        for (index, point) in points.iter().enumerate() {
            let in_bounds = point.fraction.is_finite()
                && point.percent.is_finite()
                && (0.0..=1.0).contains(&point.fraction)
                && (0.0..=100.0).contains(&point.percent);
            if !in_bounds {
                return Err(CurveError::OutOfRange {
                    id: id.to_string(),
                    index,
                });
            }
        }
        let first = points[0];
        let last = points[points.len() - 1];
        if first.fraction != 0.0
            || first.percent != 0.0
            || last.fraction != 1.0
            || last.percent != 100.0
        {
            return Err(CurveError::OpenEnds { id: id.to_string() });
        }
        for (offset, pair) in points.windows(2).enumerate() {
            let index = offset + 1;
            if pair[1].fraction <= pair[0].fraction {
                return Err(CurveError::NonIncreasingFraction {
                    id: id.to_string(),
                    index,
                });
            }
            if pair[1].percent < pair[0].percent {
                return Err(CurveError::DecreasingPercent {
                    id: id.to_string(),
                    index,
                });
            }
        }
        Ok(Self(points))
    }

    pub fn as_slice(&self) -> &[ControlPoint] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "points", rename_all = "snake_case")]
pub enum CurveShape {
    Linear,
    FrontLoaded,
    BackLoaded,
    Bell,
    Custom(ControlPoints),
}

impl CurveShape {
    pub fn control_points(&self) -> &[ControlPoint] {
        match self {
            CurveShape::Linear => &LINEAR_POINTS,
            CurveShape::FrontLoaded => &FRONT_LOADED_POINTS,
            CurveShape::BackLoaded => &BACK_LOADED_POINTS,
            CurveShape::Bell => &BELL_POINTS,
            CurveShape::Custom(points) => points.as_slice(),
        }
    }
}

/// Blend weight between a straight line (0) and the profile's own shape (100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Steepness(u8);

impl Steepness {
    pub const LINEAR: Steepness = Steepness(0);
    pub const NATIVE: Steepness = Steepness(100);

    pub fn new(value: u8) -> Result<Self, CurveError> {
        if value > 100 {
            return Err(CurveError::InvalidSteepness(u32::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn weight(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Steepness {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl TryFrom<u8> for Steepness {
    type Error = CurveError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Steepness> for u8 {
    fn from(value: Steepness) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveProfile {
    pub id: String,
    pub display_name: String,
    pub shape: CurveShape,
}

impl CurveProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, shape: CurveShape) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            shape,
        }
    }

    /// Cumulative percent at each of the `period_count + 1` period boundaries.
    ///
    /// The profile's shape is blended toward a straight line by `steepness`,
    /// then sampled with piecewise-linear interpolation between control points.
    /// The sequence starts at exactly 0, ends at exactly 100 and never
    /// decreases. A zero-length timeline is spent at once: `[100.0]`.
    pub fn interpolate(&self, steepness: Steepness, period_count: u32) -> Vec<f64> {
        if period_count == 0 {
            return vec![100.0];
        }
        let points = self.shape.control_points();
        let weight = steepness.weight();
        let periods = f64::from(period_count);

        let mut samples = Vec::with_capacity(period_count as usize + 1);
        let mut previous = 0.0_f64;
        for boundary in 0..=period_count {
            let value = if boundary == 0 {
                0.0
            } else if boundary == period_count {
                100.0
            } else {
                let x = f64::from(boundary) / periods;
                let linear = x * 100.0;
                let native = sample(points, x);
                (linear + weight * (native - linear)).clamp(0.0, 100.0)
            };
            previous = previous.max(value);
            samples.push(previous);
        }
        samples
    }
}

fn sample(points: &[ControlPoint], x: f64) -> f64 {
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if x <= b.fraction {
            let t = (x - a.fraction) / (b.fraction - a.fraction);
            return a.percent + t * (b.percent - a.percent);
        }
    }
    100.0
}

/// Host-supplied curve definition, validated when the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveDefinition {
    pub id: String,
    pub display_name: String,
    pub points: Vec<ControlPoint>,
}

impl CurveDefinition {
    pub fn into_profile(self) -> Result<CurveProfile, CurveError> {
        let points = ControlPoints::new(&self.id, self.points)?;
        Ok(CurveProfile::new(
            self.id,
            self.display_name,
            CurveShape::Custom(points),
        ))
    }
}
