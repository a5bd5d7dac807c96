use crate::error::GraphError;
use crate::graph::{ProjectGraph, TopologicalOrder};
use crate::node::{DependencyEdge, NodeId, Period};
use crate::scheduler::NodeSchedule;
use std::collections::{HashMap, HashSet};

/// Traces the chain of zero-float nodes from project start to project finish.
pub struct CriticalPath<'a> {
    graph: &'a ProjectGraph,
    schedules: &'a HashMap<NodeId, NodeSchedule>,
    project_finish: Period,
}

impl<'a> CriticalPath<'a> {
    pub fn new(
        graph: &'a ProjectGraph,
        schedules: &'a HashMap<NodeId, NodeSchedule>,
        project_finish: Period,
    ) -> Self {
        Self {
            graph,
            schedules,
            project_finish,
        }
    }

    /// Chain of critical nodes linked by driving edges, ending at the project
    /// finish. Ties go to the lowest node id. Falls back to every critical node
    /// ordered by (early start, id) when no such chain exists.
    pub fn trace(&self, order: &TopologicalOrder) -> Result<Vec<NodeId>, GraphError> {
        let mut starts = Vec::new();
        for &node_id in order.iter() {
            if !self.is_critical(node_id) {
                continue;
            }
            let driven = self
                .graph
                .incoming_edges(node_id)?
                .iter()
                .any(|edge| self.is_critical(edge.predecessor) && self.is_driving(edge));
            if !driven {
                starts.push(node_id);
            }
        }
        starts.sort_by_key(|id| (self.early_start(*id), *id));

        let mut dead_ends: HashSet<NodeId> = HashSet::new();
        for start in starts {
            if let Some(mut chain) = self.extend(start, &mut dead_ends)? {
                chain.reverse();
                return Ok(chain);
            }
        }

        let mut critical: Vec<(Period, NodeId)> = self
            .schedules
            .values()
            .filter(|schedule| schedule.is_critical)
            .map(|schedule| (schedule.early_start, schedule.id))
            .collect();
        critical.sort();
        Ok(critical.into_iter().map(|(_, id)| id).collect())
    }

    /// Returns the chain from `node_id` to the finish in reverse order.
    fn extend(
        &self,
        node_id: NodeId,
        dead_ends: &mut HashSet<NodeId>,
    ) -> Result<Option<Vec<NodeId>>, GraphError> {
        if dead_ends.contains(&node_id) {
            return Ok(None);
        }
        for edge in self.graph.outgoing_edges(node_id)? {
            if !self.is_critical(edge.successor) || !self.is_driving(edge) {
                continue;
            }
            if let Some(mut chain) = self.extend(edge.successor, dead_ends)? {
                chain.push(node_id);
                return Ok(Some(chain));
            }
        }
        let reaches_finish = self
            .schedules
            .get(&node_id)
            .map(|schedule| schedule.early_finish == self.project_finish)
            .unwrap_or(false);
        if reaches_finish {
            return Ok(Some(vec![node_id]));
        }
        dead_ends.insert(node_id);
        Ok(None)
    }

    fn is_critical(&self, node_id: NodeId) -> bool {
        self.schedules
            .get(&node_id)
            .map(|schedule| schedule.is_critical)
            .unwrap_or(false)
    }

    fn early_start(&self, node_id: NodeId) -> Period {
        self.schedules
            .get(&node_id)
            .map(|schedule| schedule.early_start)
            .unwrap_or_default()
    }

    /// An edge drives its successor when its constraint holds with equality.
    fn is_driving(&self, edge: &DependencyEdge) -> bool {
        let (Some(pred), Some(succ)) = (
            self.schedules.get(&edge.predecessor),
            self.schedules.get(&edge.successor),
        ) else {
            return false;
        };
        let anchor = if edge.kind.from_finish() {
            pred.early_finish
        } else {
            pred.early_start
        };
        let target = if edge.kind.constrains_finish() {
            succ.early_finish
        } else {
            succ.early_start
        };
        anchor.checked_add(edge.lag) == Some(target)
    }
}
