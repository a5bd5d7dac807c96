use crate::error::GraphError;
use crate::graph::{ProjectGraph, TopologicalOrder};
use crate::node::{DependencyEdge, NodeId, Period};
use std::collections::HashMap;
use tracing::debug;

pub struct BackwardPass<'a> {
    graph: &'a ProjectGraph,
    early: &'a HashMap<NodeId, (Period, Period)>,
}

impl<'a> BackwardPass<'a> {
    pub fn new(graph: &'a ProjectGraph, early: &'a HashMap<NodeId, (Period, Period)>) -> Self {
        Self { graph, early }
    }

    /// Late start and late finish keyed by node id, seeded from `project_finish`.
    pub fn execute(
        &self,
        order: &TopologicalOrder,
        project_finish: Period,
    ) -> Result<HashMap<NodeId, (Period, Period)>, GraphError> {
        let mut late: HashMap<NodeId, (Period, Period)> = HashMap::with_capacity(order.len());

        for &node_id in order.as_slice().iter().rev() {
            let &(early_start, early_finish) = self
                .early
                .get(&node_id)
                .ok_or(GraphError::UnknownNode(node_id))?;
            let span = early_finish - early_start;

            let mut late_finish = project_finish;
            for edge in self.graph.outgoing_edges(node_id)? {
                if let Some(&(ls, lf)) = late.get(&edge.successor) {
                    let allowed = allowed_finish(edge, ls, lf, span)
                        .ok_or(GraphError::PeriodOverflow(node_id))?;
                    late_finish = late_finish.min(allowed);
                }
            }
            let late_start = late_finish
                .checked_sub(span)
                .ok_or(GraphError::PeriodOverflow(node_id))?;

            late.insert(node_id, (late_start, late_finish));
        }

        debug!(nodes = late.len(), project_finish, "backward pass complete");
        Ok(late)
    }
}

/// Latest finish the edge allows for a predecessor occupying `span` periods.
fn allowed_finish(
    edge: &DependencyEdge,
    succ_late_start: Period,
    succ_late_finish: Period,
    span: Period,
) -> Option<Period> {
    let anchor = if edge.kind.constrains_finish() {
        succ_late_finish
    } else {
        succ_late_start
    };
    let bound = anchor.checked_sub(edge.lag)?;
    if edge.kind.from_finish() {
        Some(bound)
    } else {
        bound.checked_add(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RelationKind;

    #[test]
    fn allowed_finish_mirrors_forward_constraints() {
        let edge = |kind| DependencyEdge::new(NodeId(1), NodeId(2), kind, 2);
        // Successor late window is [10, 14); predecessor spans 5 periods.
        assert_eq!(allowed_finish(&edge(RelationKind::FinishToStart), 10, 14, 5), Some(8));
        assert_eq!(allowed_finish(&edge(RelationKind::StartToStart), 10, 14, 5), Some(13));
        assert_eq!(allowed_finish(&edge(RelationKind::FinishToFinish), 10, 14, 5), Some(12));
        assert_eq!(allowed_finish(&edge(RelationKind::StartToFinish), 10, 14, 5), Some(17));
    }
}
