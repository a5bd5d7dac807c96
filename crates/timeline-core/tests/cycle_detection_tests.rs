use timeline_core::graph::validate;
use timeline_core::{DependencyEdge, EdgeKey, NodeId, ProjectGraph, ScheduleNode};

fn fs(from: u64, to: u64) -> DependencyEdge {
    DependencyEdge::finish_to_start(NodeId(from), NodeId(to))
}

fn key(from: u64, to: u64) -> EdgeKey {
    EdgeKey::new(NodeId(from), NodeId(to))
}

fn graph(ids: &[u64], edges: Vec<DependencyEdge>) -> ProjectGraph {
    ProjectGraph::from_parts(
        ids.iter().map(|id| ScheduleNode::new(*id, format!("N{id}"), 1)),
        edges,
    )
    .unwrap()
}

#[test]
fn closing_a_chain_reports_every_edge_of_the_loop() {
    let g = graph(&[1, 2, 3], vec![fs(1, 2), fs(2, 3), fs(3, 1)]);
    let err = validate(&g).unwrap_err();
    assert_eq!(err.offending_edges, vec![key(1, 2), key(2, 3), key(3, 1)]);
}

#[test]
fn cycle_report_excludes_the_approach_path() {
    let g = graph(&[1, 2, 3, 4], vec![fs(1, 2), fs(2, 3), fs(3, 4), fs(4, 2)]);
    let err = validate(&g).unwrap_err();
    assert_eq!(err.offending_edges, vec![key(2, 3), key(3, 4), key(4, 2)]);
    assert!(!err.contains(NodeId(1), NodeId(2)));
}

#[test]
fn cycle_in_a_later_component_is_found() {
    let g = graph(&[1, 2, 10, 11], vec![fs(1, 2), fs(10, 11), fs(11, 10)]);
    let err = validate(&g).unwrap_err();
    assert_eq!(err.offending_edges, vec![key(10, 11), key(11, 10)]);
}

#[test]
fn acyclic_graph_yields_order_covering_every_node() {
    let g = graph(
        &[5, 3, 8, 1],
        vec![fs(5, 3), fs(3, 1), fs(8, 1), fs(5, 8)],
    );
    let order = validate(&g).unwrap();
    assert_eq!(order.len(), 4);
    let ids = order.into_vec();
    let pos = |id: u64| ids.iter().position(|n| *n == NodeId(id)).unwrap();
    assert!(pos(5) < pos(3));
    assert!(pos(5) < pos(8));
    assert!(pos(3) < pos(1));
    assert!(pos(8) < pos(1));
}

#[test]
fn order_is_stable_across_runs() {
    let build = || graph(&[1, 2, 3, 4, 5], vec![fs(1, 4), fs(2, 4), fs(3, 5), fs(4, 5)]);
    assert_eq!(validate(&build()).unwrap(), validate(&build()).unwrap());
}

#[test]
fn empty_graph_is_trivially_acyclic() {
    let order = validate(&ProjectGraph::new()).unwrap();
    assert!(order.is_empty());
}
