use chrono::NaiveDate;
use timeline_core::{PeriodCalendar, PeriodUnit, ProjectSettings};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn monthly_periods_follow_calendar_months() {
    let cal = PeriodCalendar::new(d(2025, 1, 1), PeriodUnit::Month);
    assert_eq!(cal.start_date(0), Some(d(2025, 1, 1)));
    assert_eq!(cal.start_date(14), Some(d(2026, 3, 1)));
    assert_eq!(cal.start_date(-1), Some(d(2024, 12, 1)));
    assert_eq!(cal.period_of(d(2026, 3, 15)), 14);
    assert_eq!(cal.period_of(d(2024, 12, 31)), -1);
}

#[test]
fn month_end_epoch_clamps_to_short_months() {
    let cal = PeriodCalendar::new(d(2025, 1, 31), PeriodUnit::Month);
    assert_eq!(cal.start_date(1), Some(d(2025, 2, 28)));
    assert_eq!(cal.period_of(d(2025, 2, 28)), 1);
    assert_eq!(cal.period_of(d(2025, 2, 27)), 0);
    assert_eq!(cal.period_of(d(2025, 3, 31)), 2);
}

#[test]
fn daily_periods_round_trip() {
    let cal = PeriodCalendar::new(d(2025, 6, 1), PeriodUnit::Day);
    for period in [-3, 0, 45, 400] {
        let date = cal.start_date(period).unwrap();
        assert_eq!(cal.period_of(date), period);
    }
}

#[test]
fn settings_build_their_calendar() {
    let settings = ProjectSettings {
        epoch_date: d(2026, 4, 6),
        period_unit: PeriodUnit::Week,
        ..ProjectSettings::default()
    };
    let cal = settings.calendar();
    assert_eq!(cal.epoch(), d(2026, 4, 6));
    assert_eq!(cal.unit(), PeriodUnit::Week);
    assert_eq!(cal.start_date(1), Some(d(2026, 4, 13)));
}
