use timeline_core::NodeId;
use timeline_cost::catalog::{BACK_LOADED, BELL, FRONT_LOADED, LINEAR};
use timeline_cost::{
    AllocationRow, CurveCatalog, CurveError, AllocationError, Money, PeriodAllocator, Steepness,
};

const FACT: NodeId = NodeId(42);

fn allocate(
    catalog: &CurveCatalog,
    total: Money,
    start: i64,
    periods: u32,
    curve: &str,
    steepness: u8,
) -> Vec<AllocationRow> {
    PeriodAllocator::new(catalog)
        .allocate(FACT, total, start, periods, curve, Steepness::new(steepness).unwrap())
        .unwrap()
}

fn amounts(rows: &[AllocationRow]) -> Vec<i64> {
    rows.iter().map(|r| r.amount.minor()).collect()
}

#[test]
fn linear_curve_splits_evenly() {
    let catalog = CurveCatalog::standard();
    let rows = allocate(&catalog, Money::from_major(100_000), 3, 4, LINEAR, 0);

    assert_eq!(amounts(&rows), vec![2_500_000; 4]);
    let periods: Vec<i64> = rows.iter().map(|r| r.period).collect();
    assert_eq!(periods, vec![3, 4, 5, 6]);
    let indices: Vec<u32> = rows.iter().map(|r| r.period_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert!(rows.iter().all(|r| r.fact_id == FACT));
}

#[test]
fn remainder_lands_on_the_last_period() {
    let catalog = CurveCatalog::standard();
    let rows = allocate(&catalog, Money::from_minor(100_001), 0, 4, LINEAR, 0);
    assert_eq!(amounts(&rows), vec![25_000, 25_000, 25_000, 25_001]);
}

#[test]
fn bell_curve_peaks_in_the_middle_and_sums_exactly() {
    let catalog = CurveCatalog::standard();
    let total = Money::from_major(90_000);
    let rows = allocate(&catalog, total, 0, 9, BELL, 100);

    assert_eq!(rows.len(), 9);
    assert_eq!(rows.iter().map(|r| r.amount).sum::<Money>(), total);

    let expected = [
        220_000, 480_000, 980_000, 1_720_000, 2_200_000, 1_720_000, 980_000, 480_000, 220_000,
    ];
    for (row, want) in rows.iter().zip(expected) {
        assert!(
            (row.amount.minor() - want).abs() <= 10,
            "period {}: {} vs {}",
            row.period_index,
            row.amount,
            want
        );
    }
    let got = amounts(&rows);
    assert!(got[4] > 4 * got[0]);
    assert!(got[4] > 4 * got[8]);
}

#[test]
fn zero_periods_book_everything_at_the_start() {
    let catalog = CurveCatalog::standard();
    let rows = allocate(&catalog, Money::from_minor(12_345), 7, 0, FRONT_LOADED, 60);
    assert_eq!(
        rows,
        vec![AllocationRow {
            fact_id: FACT,
            period_index: 0,
            period: 7,
            amount: Money::from_minor(12_345),
        }]
    );
}

#[test]
fn single_period_takes_the_whole_total() {
    let catalog = CurveCatalog::standard();
    let rows = allocate(&catalog, Money::from_minor(-999), 2, 1, BACK_LOADED, 100);
    assert_eq!(amounts(&rows), vec![-999]);
}

#[test]
fn every_profile_sums_exactly_and_negative_totals_mirror() {
    let catalog = CurveCatalog::standard();
    let totals = [0, 1, 7, 100_001, 987_654_321, 12_345_678_901];
    for curve in [LINEAR, FRONT_LOADED, BACK_LOADED, BELL] {
        for steepness in [0, 37, 100] {
            for periods in 1..=24 {
                for minor in totals {
                    let total = Money::from_minor(minor);
                    let rows = allocate(&catalog, total, 0, periods, curve, steepness);
                    assert_eq!(rows.len(), periods as usize);
                    assert_eq!(rows.iter().map(|r| r.amount).sum::<Money>(), total);
                    assert!(rows.iter().all(|r| !r.amount.is_negative()));

                    let mirrored = allocate(&catalog, -total, 0, periods, curve, steepness);
                    let negated: Vec<i64> = amounts(&rows).into_iter().map(|a| -a).collect();
                    assert_eq!(amounts(&mirrored), negated, "{curve} s={steepness} n={periods}");
                }
            }
        }
    }
}

#[test]
fn allocation_is_deterministic() {
    let catalog = CurveCatalog::standard();
    let first = allocate(&catalog, Money::from_minor(1_234_567), 5, 13, FRONT_LOADED, 73);
    let second = allocate(&catalog, Money::from_minor(1_234_567), 5, 13, FRONT_LOADED, 73);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn front_loaded_spends_more_early_than_back_loaded() {
    let catalog = CurveCatalog::standard();
    let total = Money::from_major(10_000);
    let front = amounts(&allocate(&catalog, total, 0, 10, FRONT_LOADED, 100));
    let back = amounts(&allocate(&catalog, total, 0, 10, BACK_LOADED, 100));
    assert!(front[0] > back[0]);
    assert!(front[9] < back[9]);
}

#[test]
fn unknown_curve_is_a_structural_error() {
    let catalog = CurveCatalog::standard();
    let err = PeriodAllocator::new(&catalog)
        .allocate(FACT, Money::from_major(1), 0, 3, "zigzag", Steepness::NATIVE)
        .unwrap_err();
    assert_eq!(
        err,
        AllocationError::Curve(CurveError::UnknownProfile("zigzag".to_string()))
    );
}
