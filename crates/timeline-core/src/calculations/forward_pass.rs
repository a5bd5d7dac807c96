use crate::error::GraphError;
use crate::graph::{ProjectGraph, TopologicalOrder};
use crate::node::{DependencyEdge, NodeId, Period};
use crate::scheduler::BaselineInfeasibleWarning;
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct ForwardPassOutput {
    /// Early start and early finish keyed by node id.
    pub dates: HashMap<NodeId, (Period, Period)>,
    pub infeasible: Vec<BaselineInfeasibleWarning>,
}

pub struct ForwardPass<'a> {
    graph: &'a ProjectGraph,
    project_start: Period,
}

impl<'a> ForwardPass<'a> {
    pub fn new(graph: &'a ProjectGraph, project_start: Period) -> Self {
        Self {
            graph,
            project_start,
        }
    }

    pub fn execute(&self, order: &TopologicalOrder) -> Result<ForwardPassOutput, GraphError> {
        let mut dates: HashMap<NodeId, (Period, Period)> = HashMap::with_capacity(order.len());
        let mut infeasible = Vec::new();

        for &node_id in order.iter() {
            let node = self
                .graph
                .node(node_id)
                .ok_or(GraphError::UnknownNode(node_id))?;
            let span = node.span();
            let incoming = self.graph.incoming_edges(node_id)?;

            let constrained_start = if incoming.is_empty() {
                node.baseline_start.unwrap_or(self.project_start)
            } else {
                let mut start = self.project_start;
                for edge in &incoming {
                    if let Some(&(es, ef)) = dates.get(&edge.predecessor) {
                        let required = required_start(edge, es, ef, span)
                            .ok_or(GraphError::PeriodOverflow(node_id))?;
                        start = start.max(required);
                    }
                }
                start
            };

            // A locked node reports its pinned start; constraints only feed the feasibility check.
            let early_start = match (node.is_baseline_locked, node.baseline_start) {
                (true, Some(locked_start)) => {
                    if constrained_start > locked_start {
                        let delta = constrained_start
                            .checked_sub(locked_start)
                            .ok_or(GraphError::PeriodOverflow(node_id))?;
                        warn!(
                            node = %node_id,
                            delta,
                            "baseline-locked node cannot meet its constraints"
                        );
                        infeasible.push(BaselineInfeasibleWarning { node_id, delta });
                    }
                    locked_start
                }
                _ => constrained_start,
            };

            let early_finish = early_start
                .checked_add(span)
                .ok_or(GraphError::PeriodOverflow(node_id))?;
            dates.insert(node_id, (early_start, early_finish));
        }

        debug!(nodes = dates.len(), "forward pass complete");
        Ok(ForwardPassOutput { dates, infeasible })
    }
}

/// Earliest start the edge allows for a successor occupying `span` periods.
/// `None` when the result leaves the `Period` range.
fn required_start(
    edge: &DependencyEdge,
    pred_start: Period,
    pred_finish: Period,
    span: Period,
) -> Option<Period> {
    let anchor = if edge.kind.from_finish() {
        pred_finish
    } else {
        pred_start
    };
    let bound = anchor.checked_add(edge.lag)?;
    if edge.kind.constrains_finish() {
        bound.checked_sub(span)
    } else {
        Some(bound)
    }
}
