use crate::node::Period;
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Day,
    Week,
    #[default]
    Month,
}

/// Maps integer periods onto calendar dates, counting from an epoch date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCalendar {
    epoch: NaiveDate,
    unit: PeriodUnit,
}

impl PeriodCalendar {
    pub fn new(epoch: NaiveDate, unit: PeriodUnit) -> Self {
        Self { epoch, unit }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// First calendar day of `period`, or `None` when it falls outside chrono's range.
    pub fn start_date(&self, period: Period) -> Option<NaiveDate> {
        match self.unit {
            PeriodUnit::Day => self.epoch.checked_add_signed(Duration::try_days(period)?),
            PeriodUnit::Week => self
                .epoch
                .checked_add_signed(Duration::try_weeks(period)?),
            PeriodUnit::Month => {
                let months = u32::try_from(period.unsigned_abs()).ok()?;
                if period >= 0 {
                    self.epoch.checked_add_months(Months::new(months))
                } else {
                    self.epoch.checked_sub_months(Months::new(months))
                }
            }
        }
    }

    /// Period containing `date`. Dates before the epoch map to negative periods.
    pub fn period_of(&self, date: NaiveDate) -> Period {
        match self.unit {
            PeriodUnit::Day => (date - self.epoch).num_days(),
            PeriodUnit::Week => (date - self.epoch).num_days().div_euclid(7),
            PeriodUnit::Month => {
                let months = (date.year() as i64 - self.epoch.year() as i64) * 12
                    + (date.month() as i64 - self.epoch.month() as i64);
                // Month periods start on the epoch's day-of-month, clamped to short months.
                match self.start_date(months) {
                    Some(start) if start > date => months - 1,
                    _ => months,
                }
            }
        }
    }
}
