use crate::catalog::CurveCatalog;
use crate::curve::Steepness;
use crate::error::AllocationError;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use timeline_core::{NodeId, Period};
use tracing::debug;

/// Fixed-point denominator for period shares: one billion parts make 100%.
pub const PARTS_PER_WHOLE: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub fact_id: NodeId,
    pub period_index: u32,
    pub period: Period,
    pub amount: Money,
}

/// Spreads a total across consecutive periods along a catalog curve.
pub struct PeriodAllocator<'a> {
    catalog: &'a CurveCatalog,
}

impl<'a> PeriodAllocator<'a> {
    pub fn new(catalog: &'a CurveCatalog) -> Self {
        Self { catalog }
    }

    /// One row per period in `start_period..start_period + period_count`.
    ///
    /// Rows sum to `total` exactly. Each period but the last receives its
    /// curve share truncated toward zero; the last absorbs the remainder.
    /// A zero-length span books the whole total in `start_period`.
    pub fn allocate(
        &self,
        fact_id: NodeId,
        total: Money,
        start_period: Period,
        period_count: u32,
        profile_id: &str,
        steepness: Steepness,
    ) -> Result<Vec<AllocationRow>, AllocationError> {
        let samples = self.catalog.interpolate(profile_id, steepness, period_count)?;
        if start_period.checked_add(i64::from(period_count)).is_none() {
            return Err(AllocationError::PeriodCountTooLarge(i64::from(period_count)));
        }

        if period_count == 0 {
            return Ok(vec![AllocationRow {
                fact_id,
                period_index: 0,
                period: start_period,
                amount: total,
            }]);
        }

        let cumulative: Vec<i64> = samples.iter().map(|&percent| to_parts(percent)).collect();
        let mut rows = Vec::with_capacity(period_count as usize);
        let mut booked = Money::ZERO;
        for (index, bounds) in cumulative.windows(2).enumerate() {
            let period_index = index as u32;
            let amount = if period_index + 1 == period_count {
                total - booked
            } else {
                share_of(total, bounds[1] - bounds[0])
            };
            booked += amount;
            rows.push(AllocationRow {
                fact_id,
                period_index,
                period: start_period + i64::from(period_index),
                amount,
            });
        }

        debug!(
            fact = %fact_id,
            curve = profile_id,
            steepness = steepness.value(),
            periods = period_count,
            total = %total,
            "allocated fact across periods"
        );
        Ok(rows)
    }
}

/// Number of whole periods a node of `duration` spans.
pub fn period_count_for(duration: Period) -> Result<u32, AllocationError> {
    u32::try_from(duration).map_err(|_| AllocationError::PeriodCountTooLarge(duration))
}

fn to_parts(percent: f64) -> i64 {
    let parts = (percent / 100.0 * PARTS_PER_WHOLE as f64).round() as i64;
    parts.clamp(0, PARTS_PER_WHOLE)
}

fn share_of(total: Money, parts: i64) -> Money {
    let minor = i128::from(total.minor()) * i128::from(parts) / i128::from(PARTS_PER_WHOLE);
    // |minor| <= |total| because parts <= PARTS_PER_WHOLE.
    Money::from_minor(minor as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LINEAR;

    #[test]
    fn shares_truncate_toward_zero_for_negative_totals() {
        assert_eq!(share_of(Money::from_minor(-10), 250_000_000), Money::from_minor(-2));
        assert_eq!(share_of(Money::from_minor(10), 250_000_000), Money::from_minor(2));
    }

    #[test]
    fn percent_converts_to_parts_per_billion() {
        assert_eq!(to_parts(0.0), 0);
        assert_eq!(to_parts(25.0), 250_000_000);
        assert_eq!(to_parts(100.0), PARTS_PER_WHOLE);
    }

    #[test]
    fn overflowing_period_range_is_rejected() {
        let catalog = CurveCatalog::standard();
        let err = PeriodAllocator::new(&catalog)
            .allocate(NodeId(1), Money::from_major(1), i64::MAX, 2, LINEAR, Steepness::NATIVE)
            .unwrap_err();
        assert_eq!(err, AllocationError::PeriodCountTooLarge(2));
    }

    #[test]
    fn negative_duration_has_no_period_count() {
        assert_eq!(period_count_for(4), Ok(4));
        assert_eq!(period_count_for(-1), Err(AllocationError::PeriodCountTooLarge(-1)));
    }
}
