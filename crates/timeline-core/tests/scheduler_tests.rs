use timeline_core::graph::validate;
use timeline_core::{
    CpmScheduler, DependencyEdge, GraphError, NodeId, ProjectGraph, ProjectSettings,
    RelationKind, ScheduleNode, ScheduleResult, ScheduleWarning,
};

fn n(id: u64) -> NodeId {
    NodeId(id)
}

fn edge(from: u64, to: u64, kind: RelationKind, lag: i64) -> DependencyEdge {
    DependencyEdge::new(n(from), n(to), kind, lag)
}

fn fs(from: u64, to: u64) -> DependencyEdge {
    DependencyEdge::finish_to_start(n(from), n(to))
}

fn run(graph: &ProjectGraph) -> ScheduleResult {
    run_with(graph, &ProjectSettings::default())
}

fn run_with(graph: &ProjectGraph, settings: &ProjectSettings) -> ScheduleResult {
    let order = validate(graph).unwrap();
    CpmScheduler::new(settings).schedule(graph, &order).unwrap()
}

fn dates(result: &ScheduleResult, id: u64) -> (i64, i64, i64, i64, i64) {
    let s = result.node(n(id)).unwrap();
    (
        s.early_start,
        s.early_finish,
        s.late_start,
        s.late_finish,
        s.total_float,
    )
}

#[test]
fn chain_of_three_is_entirely_critical() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "A", 5),
            ScheduleNode::new(2, "B", 3),
            ScheduleNode::new(3, "C", 7),
        ],
        vec![fs(1, 2), fs(2, 3)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(result.project_duration(), 15);
    assert_eq!(dates(&result, 1), (0, 5, 0, 5, 0));
    assert_eq!(dates(&result, 2), (5, 8, 5, 8, 0));
    assert_eq!(dates(&result, 3), (8, 15, 8, 15, 0));
    assert_eq!(result.critical_path, vec![n(1), n(2), n(3)]);
    assert_eq!(result.critical_nodes, vec![n(1), n(2), n(3)]);
    assert!(result.warnings.is_empty());
}

#[test]
fn diamond_reports_float_on_short_branch() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "T1", 2),
            ScheduleNode::new(2, "T2", 3),
            ScheduleNode::new(3, "T3", 1),
            ScheduleNode::new(4, "T4", 2),
        ],
        vec![fs(1, 2), fs(1, 3), fs(2, 4), fs(3, 4)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(result.project_finish, 7);
    assert_eq!(dates(&result, 3), (2, 3, 4, 5, 2));
    assert!(!result.node(n(3)).unwrap().is_critical);
    assert_eq!(result.critical_path, vec![n(1), n(2), n(4)]);
    assert_eq!(result.summary().critical_count, 3);
}

#[test]
fn equal_parallel_paths_break_ties_by_lowest_id() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "Start", 2),
            ScheduleNode::new(2, "Left", 3),
            ScheduleNode::new(3, "Right", 3),
            ScheduleNode::new(4, "Join", 1),
        ],
        vec![fs(1, 3), fs(1, 2), fs(3, 4), fs(2, 4)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(result.critical_path, vec![n(1), n(2), n(4)]);
    assert!(result.node(n(3)).unwrap().is_critical);
}

#[test]
fn start_to_start_with_lag() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Excavation", 10), ScheduleNode::new(2, "Shoring", 4)],
        vec![edge(1, 2, RelationKind::StartToStart, 2)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 2), (2, 6, 6, 10, 4));
    assert_eq!(dates(&result, 1), (0, 10, 0, 10, 0));
    assert_eq!(result.critical_path, vec![n(1)]);
}

#[test]
fn finish_to_finish_with_lag() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Drywall", 4), ScheduleNode::new(2, "Paint", 2)],
        vec![edge(1, 2, RelationKind::FinishToFinish, 3)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 2), (5, 7, 5, 7, 0));
    assert_eq!(dates(&result, 1), (0, 4, 0, 4, 0));
    assert_eq!(result.critical_path, vec![n(1), n(2)]);
}

#[test]
fn start_to_finish_with_lag() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "New system", 5), ScheduleNode::new(2, "Old system", 3)],
        vec![edge(1, 2, RelationKind::StartToFinish, 6)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(result.project_finish, 6);
    assert_eq!(dates(&result, 2), (3, 6, 3, 6, 0));
    assert_eq!(dates(&result, 1), (0, 5, 0, 5, 0));
    assert_eq!(result.critical_path, vec![n(1), n(2)]);
}

#[test]
fn negative_lag_models_lead_time() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Design", 5), ScheduleNode::new(2, "Procurement", 4)],
        vec![edge(1, 2, RelationKind::FinishToStart, -2)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 2), (3, 7, 3, 7, 0));
    assert_eq!(result.project_finish, 7);
}

#[test]
fn early_start_never_precedes_project_start() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Survey", 2), ScheduleNode::new(2, "Grading", 6)],
        vec![edge(1, 2, RelationKind::FinishToFinish, 0)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 2), (0, 6, 0, 6, 0));
    assert_eq!(dates(&result, 1), (0, 2, 4, 6, 4));
    assert_eq!(result.critical_path, vec![n(2)]);
}

#[test]
fn unconstrained_node_starts_at_its_baseline() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "Groundbreaking", 1).with_baseline_start(4),
            ScheduleNode::new(2, "Foundations", 3),
        ],
        vec![fs(1, 2)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 1).0, 4);
    assert_eq!(dates(&result, 2), (5, 8, 5, 8, 0));
}

#[test]
fn project_start_setting_shifts_roots() {
    let graph = ProjectGraph::from_parts(vec![ScheduleNode::new(1, "Only", 3)], vec![]).unwrap();
    let settings = ProjectSettings {
        project_start: 6,
        ..ProjectSettings::default()
    };
    let result = run_with(&graph, &settings);
    assert_eq!(dates(&result, 1), (6, 9, 6, 9, 0));
    assert_eq!(result.project_duration(), 3);
}

#[test]
fn infeasible_lock_warns_without_moving_the_node() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "Permits", 5),
            ScheduleNode::new(2, "Closing", 3).locked_at(3),
        ],
        vec![fs(1, 2)],
    )
    .unwrap();
    let result = run(&graph);

    let warnings: Vec<_> = result.baseline_warnings().copied().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].node_id, n(2));
    assert_eq!(warnings[0].delta, 2);
    assert_eq!(dates(&result, 2), (3, 6, 3, 6, 0));
    assert_eq!(dates(&result, 1).4, -2);
    assert!(!result.node(n(1)).unwrap().is_critical);
    assert_eq!(result.critical_nodes, vec![n(2)]);
    assert_eq!(result.critical_path, vec![n(2)]);
}

#[test]
fn feasible_lock_pins_start_and_leaves_slack_upstream() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "Design", 2),
            ScheduleNode::new(2, "Board approval", 3).locked_at(5),
        ],
        vec![fs(1, 2)],
    )
    .unwrap();
    let result = run(&graph);

    assert!(result.warnings.is_empty());
    assert_eq!(dates(&result, 2), (5, 8, 5, 8, 0));
    assert_eq!(dates(&result, 1), (0, 2, 3, 5, 3));
}

#[test]
fn locked_span_uses_pinned_end() {
    let mut locked = ScheduleNode::new(2, "Lease-up", 3).locked_at(4);
    locked.baseline_end = Some(10);
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Construction", 4), locked],
        vec![fs(1, 2)],
    )
    .unwrap();
    let result = run(&graph);

    assert_eq!(dates(&result, 2), (4, 10, 4, 10, 0));
    assert_eq!(result.project_finish, 10);
}

#[test]
fn later_finish_constraint_adds_float() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "A", 5), ScheduleNode::new(2, "B", 3)],
        vec![fs(1, 2)],
    )
    .unwrap();
    let settings = ProjectSettings {
        finish_constraint: Some(12),
        ..ProjectSettings::default()
    };
    let result = run_with(&graph, &settings);

    assert_eq!(result.project_finish, 12);
    assert_eq!(dates(&result, 1).4, 4);
    assert_eq!(dates(&result, 2).4, 4);
    assert!(result.critical_nodes.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn earlier_finish_constraint_warns_and_goes_negative() {
    let graph = ProjectGraph::from_parts(
        vec![
            ScheduleNode::new(1, "A", 5),
            ScheduleNode::new(2, "B", 3),
            ScheduleNode::new(3, "C", 7),
        ],
        vec![fs(1, 2), fs(2, 3)],
    )
    .unwrap();
    let settings = ProjectSettings {
        finish_constraint: Some(12),
        ..ProjectSettings::default()
    };
    let result = run_with(&graph, &settings);

    assert_eq!(
        result.warnings,
        vec![ScheduleWarning::FinishConstraintMissed {
            constraint: 12,
            computed_finish: 15
        }]
    );
    assert!(result.nodes.iter().all(|s| s.total_float == -3));
    assert!(result.nodes.iter().all(|s| !s.is_critical));
    assert!(result.critical_nodes.is_empty());
    assert!(result.critical_path.is_empty());
}

#[test]
fn lag_overflow_fails_the_schedule() {
    let graph = ProjectGraph::from_parts(
        vec![ScheduleNode::new(1, "Permits", 1), ScheduleNode::new(2, "Closing", 1)],
        vec![edge(1, 2, RelationKind::FinishToStart, i64::MAX)],
    )
    .unwrap();
    let order = validate(&graph).unwrap();
    let err = CpmScheduler::new(&ProjectSettings::default())
        .schedule(&graph, &order)
        .unwrap_err();
    assert_eq!(err, GraphError::PeriodOverflow(n(2)));
}

#[test]
fn scheduling_is_deterministic() {
    let build = || {
        ProjectGraph::from_parts(
            (1..=6).map(|id| ScheduleNode::new(id, format!("N{id}"), (id % 3) as i64 + 1)),
            vec![fs(1, 3), fs(2, 3), fs(3, 5), fs(4, 5), fs(5, 6), fs(1, 4)],
        )
        .unwrap()
    };
    let first = run(&build());
    let second = run(&build());
    assert_eq!(first, second);
}

/// Small linear congruential generator so the graph sweep is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

#[test]
fn generated_dags_always_have_a_critical_path() {
    let kinds = [
        RelationKind::FinishToStart,
        RelationKind::StartToStart,
        RelationKind::FinishToFinish,
        RelationKind::StartToFinish,
    ];
    for seed in 1..=40u64 {
        let mut rng = Lcg(seed);
        let count = 2 + rng.next(24);
        let nodes: Vec<ScheduleNode> = (1..=count)
            .map(|id| ScheduleNode::new(id, format!("N{id}"), rng.next(7) as i64))
            .collect();
        let mut edges = Vec::new();
        for to in 2..=count {
            for from in 1..to {
                if rng.next(4) == 0 {
                    let kind = kinds[rng.next(4) as usize];
                    let lag = rng.next(6) as i64 - 2;
                    edges.push(edge(from, to, kind, lag));
                }
            }
        }
        let graph = ProjectGraph::from_parts(nodes, edges.clone()).unwrap();
        let result = run(&graph);

        assert!(!result.critical_path.is_empty(), "seed {seed}");
        let last = result.critical_path.last().unwrap();
        assert_eq!(
            result.node(*last).unwrap().early_finish,
            result.project_finish,
            "seed {seed}"
        );
        for id in &result.critical_path {
            assert_eq!(result.node(*id).unwrap().total_float, 0, "seed {seed}");
        }
        for schedule in &result.nodes {
            assert!(schedule.total_float >= 0, "seed {seed}");
            assert!(schedule.early_start >= result.project_start, "seed {seed}");
            assert!(schedule.late_finish <= result.project_finish, "seed {seed}");
        }
        for e in &edges {
            let p = result.node(e.predecessor).unwrap();
            let s = result.node(e.successor).unwrap();
            let (early_anchor, late_anchor) = match e.kind {
                RelationKind::FinishToStart | RelationKind::FinishToFinish => {
                    (p.early_finish, p.late_finish)
                }
                _ => (p.early_start, p.late_start),
            };
            let (early_target, late_target) = match e.kind {
                RelationKind::FinishToStart | RelationKind::StartToStart => {
                    (s.early_start, s.late_start)
                }
                _ => (s.early_finish, s.late_finish),
            };
            assert!(early_target >= early_anchor + e.lag, "seed {seed} edge {}", e.key());
            assert!(late_target >= late_anchor + e.lag, "seed {seed} edge {}", e.key());
        }
    }
}
