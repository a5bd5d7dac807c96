use crate::calculations::backward_pass::BackwardPass;
use crate::calculations::critical_path::CriticalPath;
use crate::calculations::forward_pass::ForwardPass;
use crate::error::GraphError;
use crate::graph::{ProjectGraph, TopologicalOrder};
use crate::metadata::ProjectSettings;
use crate::node::{ComputedDates, NodeId, Period};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A baseline-locked node whose constraints push its start past the pinned date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineInfeasibleWarning {
    pub node_id: NodeId,
    /// Periods by which the constraint-driven start exceeds the locked start.
    pub delta: Period,
}

/// Non-fatal findings returned alongside a successful schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleWarning {
    BaselineInfeasible(BaselineInfeasibleWarning),
    FinishConstraintMissed {
        constraint: Period,
        computed_finish: Period,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSchedule {
    pub id: NodeId,
    pub early_start: Period,
    pub early_finish: Period,
    pub late_start: Period,
    pub late_finish: Period,
    pub total_float: Period,
    pub is_critical: bool,
}

impl NodeSchedule {
    fn computed_dates(&self) -> ComputedDates {
        ComputedDates {
            early_start: self.early_start,
            early_finish: self.early_finish,
            late_start: self.late_start,
            late_finish: self.late_finish,
            total_float: self.total_float,
            is_critical: self.is_critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub node_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<NodeId>,
    pub project_finish: Period,
    pub warning_count: usize,
}

impl ScheduleSummary {
    pub fn to_log_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("nodes={}", self.node_count));
        parts.push(format!("critical={}", self.critical_count));
        parts.push(format!("finish={}", self.project_finish));
        if self.warning_count > 0 {
            parts.push(format!("warnings={}", self.warning_count));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Per-node dates in topological order.
    pub nodes: Vec<NodeSchedule>,
    /// Every critical node, in topological order.
    pub critical_nodes: Vec<NodeId>,
    /// Chain of critical nodes from project start to project finish.
    pub critical_path: Vec<NodeId>,
    pub project_start: Period,
    pub project_finish: Period,
    pub warnings: Vec<ScheduleWarning>,
}

impl ScheduleResult {
    pub fn node(&self, id: NodeId) -> Option<&NodeSchedule> {
        self.nodes.iter().find(|schedule| schedule.id == id)
    }

    pub fn project_duration(&self) -> Period {
        self.project_finish.saturating_sub(self.project_start)
    }

    pub fn baseline_warnings(&self) -> impl Iterator<Item = &BaselineInfeasibleWarning> + '_ {
        self.warnings.iter().filter_map(|warning| match warning {
            ScheduleWarning::BaselineInfeasible(inner) => Some(inner),
            ScheduleWarning::FinishConstraintMissed { .. } => None,
        })
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            node_count: self.nodes.len(),
            critical_count: self.critical_nodes.len(),
            critical_path: self.critical_path.clone(),
            project_finish: self.project_finish,
            warning_count: self.warnings.len(),
        }
    }
}

/// Critical Path Method scheduler over a validated dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpmScheduler {
    project_start: Period,
    finish_constraint: Option<Period>,
}

impl CpmScheduler {
    pub fn new(settings: &ProjectSettings) -> Self {
        Self {
            project_start: settings.project_start,
            finish_constraint: settings.finish_constraint,
        }
    }

    pub fn with_project_start(project_start: Period) -> Self {
        Self {
            project_start,
            finish_constraint: None,
        }
    }

    /// Computes early/late dates, float and the critical path.
    ///
    /// `order` must come from [`crate::graph::validate`] on the same graph;
    /// the graph itself is not modified (see [`CpmScheduler::apply`]).
    pub fn schedule(
        &self,
        graph: &ProjectGraph,
        order: &TopologicalOrder,
    ) -> Result<ScheduleResult, GraphError> {
        let forward = ForwardPass::new(graph, self.project_start).execute(order)?;
        let mut warnings: Vec<ScheduleWarning> = forward
            .infeasible
            .iter()
            .copied()
            .map(ScheduleWarning::BaselineInfeasible)
            .collect();

        let computed_finish = forward
            .dates
            .values()
            .map(|&(_, early_finish)| early_finish)
            .max()
            .unwrap_or(self.project_start);
        let project_finish = match self.finish_constraint {
            Some(constraint) => {
                if constraint < computed_finish {
                    warn!(
                        constraint,
                        computed_finish,
                        "finish constraint precedes computed finish"
                    );
                    warnings.push(ScheduleWarning::FinishConstraintMissed {
                        constraint,
                        computed_finish,
                    });
                }
                constraint
            }
            None => computed_finish,
        };

        let late = BackwardPass::new(graph, &forward.dates).execute(order, project_finish)?;

        let mut nodes = Vec::with_capacity(order.len());
        for &node_id in order.iter() {
            let (Some(&(early_start, early_finish)), Some(&(late_start, late_finish))) =
                (forward.dates.get(&node_id), late.get(&node_id))
            else {
                return Err(GraphError::UnknownNode(node_id));
            };
            let total_float = late_start
                .checked_sub(early_start)
                .ok_or(GraphError::PeriodOverflow(node_id))?;
            nodes.push(NodeSchedule {
                id: node_id,
                early_start,
                early_finish,
                late_start,
                late_finish,
                total_float,
                // Negative float from an infeasible lock or a missed finish
                // constraint is reported through warnings, not the critical flag.
                is_critical: total_float == 0,
            });
        }

        let by_id: HashMap<NodeId, NodeSchedule> =
            nodes.iter().map(|schedule| (schedule.id, *schedule)).collect();
        let critical_path = CriticalPath::new(graph, &by_id, project_finish).trace(order)?;
        let critical_nodes = nodes
            .iter()
            .filter(|schedule| schedule.is_critical)
            .map(|schedule| schedule.id)
            .collect();

        let result = ScheduleResult {
            nodes,
            critical_nodes,
            critical_path,
            project_start: self.project_start,
            project_finish,
            warnings,
        };
        debug!(summary = %result.summary().to_log_summary(), "schedule computed");
        Ok(result)
    }

    /// Writes computed dates into the graph's nodes.
    pub fn apply(result: &ScheduleResult, graph: &mut ProjectGraph) {
        for schedule in &result.nodes {
            if let Some(node) = graph.node_mut(schedule.id) {
                node.set_computed(schedule.computed_dates());
            }
        }
    }
}
