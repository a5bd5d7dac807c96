use super::error::RecalculationError;
use super::mutation::Mutation;
use crate::project::{AllocationInputs, FactInputs, ProjectId, ProjectLoad, ProjectSnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;
use timeline_core::graph::validate;
use timeline_core::{CpmScheduler, NodeId, NodeKind, ProjectGraph, ProjectSettings, ScheduleResult};
use timeline_cost::{AllocationRow, CurveCatalog, PeriodAllocator, period_count_for};

/// One project's graph, schedule and allocations, kept mutually consistent.
///
/// Recalculation works on a clone and swaps it in only after commit, so a
/// failed unit of work never shows through.
#[derive(Debug, Clone)]
pub(crate) struct ProjectModel {
    pub(crate) settings: ProjectSettings,
    pub(crate) graph: ProjectGraph,
    pub(crate) catalog: Arc<CurveCatalog>,
    pub(crate) facts: BTreeMap<NodeId, AllocationInputs>,
    pub(crate) allocations: BTreeMap<NodeId, Vec<AllocationRow>>,
    pub(crate) schedule: ScheduleResult,
}

impl ProjectModel {
    /// Validates host input. Dates and allocations are filled in by [`ProjectModel::recompute`].
    pub(crate) fn from_load(load: ProjectLoad) -> Result<Self, RecalculationError> {
        load.settings.validate()?;
        let catalog = CurveCatalog::load(load.curves)?;
        let graph = ProjectGraph::from_parts(load.nodes, load.edges)?;
        let mut model = Self {
            settings: load.settings,
            graph,
            catalog: Arc::new(catalog),
            facts: BTreeMap::new(),
            allocations: BTreeMap::new(),
            schedule: ScheduleResult::default(),
        };
        for FactInputs { fact_id, inputs } in load.facts {
            if model.facts.contains_key(&fact_id) {
                return Err(RecalculationError::InvalidFact {
                    fact_id,
                    reason: "allocation inputs supplied more than once".to_string(),
                });
            }
            model.check_fact(fact_id, &inputs)?;
            model.facts.insert(fact_id, inputs);
        }
        Ok(model)
    }

    /// Applies a host edit. Returns the facts whose allocations were dropped.
    pub(crate) fn apply(&mut self, mutation: &Mutation) -> Result<Vec<NodeId>, RecalculationError> {
        let mut removed = Vec::new();
        match mutation {
            Mutation::AddNode { node } => self.graph.add_node(node.clone())?,
            Mutation::RemoveNode { node_id, cascade } => {
                self.graph.remove_node(*node_id, *cascade)?;
                if self.detach_fact(*node_id) {
                    removed.push(*node_id);
                }
            }
            Mutation::AddEdge { edge } => self.graph.add_edge(edge.clone())?,
            Mutation::RemoveEdge {
                predecessor,
                successor,
            } => {
                self.graph.remove_edge(*predecessor, *successor)?;
            }
            Mutation::SetDuration { node_id, duration } => {
                self.graph.set_duration(*node_id, *duration)?
            }
            Mutation::SetLag {
                predecessor,
                successor,
                lag,
            } => self.graph.set_lag(*predecessor, *successor, *lag)?,
            Mutation::SetBaselineLock {
                node_id,
                locked,
                start,
            } => {
                let locked = *locked;
                let start = *start;
                self.graph.update_node(*node_id, |node| {
                    let current_start = node.early_start();
                    node.is_baseline_locked = locked;
                    if start.is_some() {
                        node.baseline_start = start;
                    } else if locked && node.baseline_start.is_none() {
                        node.baseline_start = current_start;
                    }
                })?;
            }
            Mutation::SetAllocationInputs { fact_id, inputs } => match inputs {
                Some(inputs) => {
                    self.check_fact(*fact_id, inputs)?;
                    self.facts.insert(*fact_id, inputs.clone());
                }
                None => {
                    if self.detach_fact(*fact_id) {
                        removed.push(*fact_id);
                    }
                }
            },
            Mutation::Refresh => {}
        }
        Ok(removed)
    }

    /// Cycle-checks and schedules the graph, writing computed dates into it.
    pub(crate) fn reschedule(&mut self) -> Result<(), RecalculationError> {
        let order = validate(&self.graph)?;
        let schedule = CpmScheduler::new(&self.settings).schedule(&self.graph, &order)?;
        CpmScheduler::apply(&schedule, &mut self.graph);
        self.schedule = schedule;
        Ok(())
    }

    /// Regenerates rows for every fact whose dates or inputs differ from
    /// `previous`. Returns the regenerated fact ids in ascending order.
    pub(crate) fn regenerate_allocations(
        &mut self,
        previous: Option<&ProjectModel>,
    ) -> Result<Vec<NodeId>, RecalculationError> {
        let allocator = PeriodAllocator::new(&self.catalog);
        let mut regenerated = Vec::new();
        for (&fact_id, inputs) in &self.facts {
            let Some(dates) = self.schedule.node(fact_id) else {
                return Err(RecalculationError::InvalidFact {
                    fact_id,
                    reason: "fact is not scheduled".to_string(),
                });
            };
            let span = (dates.early_start, dates.early_finish);
            let unchanged = previous.is_some_and(|prev| {
                prev.facts.get(&fact_id) == Some(inputs)
                    && prev.allocations.contains_key(&fact_id)
                    && prev
                        .schedule
                        .node(fact_id)
                        .map(|old| (old.early_start, old.early_finish))
                        == Some(span)
            });
            if unchanged {
                continue;
            }
            let rows = allocator.allocate(
                fact_id,
                inputs.total,
                dates.early_start,
                period_count_for(dates.early_finish - dates.early_start)?,
                &inputs.curve_id,
                inputs.steepness,
            )?;
            self.allocations.insert(fact_id, rows);
            regenerated.push(fact_id);
        }
        Ok(regenerated)
    }

    /// Ids of nodes whose computed dates differ from `previous`, in topological order.
    pub(crate) fn rescheduled_since(&self, previous: Option<&ProjectModel>) -> Vec<NodeId> {
        self.schedule
            .nodes
            .iter()
            .filter(|schedule| {
                previous
                    .and_then(|prev| prev.schedule.node(schedule.id))
                    .is_none_or(|old| old != *schedule)
            })
            .map(|schedule| schedule.id)
            .collect()
    }

    pub(crate) fn snapshot(&self, project_id: ProjectId, sequence: u64) -> ProjectSnapshot {
        ProjectSnapshot {
            project_id,
            sequence,
            settings: self.settings.clone(),
            nodes: self.graph.nodes().into_iter().cloned().collect(),
            edges: self.graph.edges().into_iter().cloned().collect(),
            facts: self
                .facts
                .iter()
                .map(|(&fact_id, inputs)| FactInputs {
                    fact_id,
                    inputs: inputs.clone(),
                })
                .collect(),
            curves: self.catalog.custom_definitions(),
            allocations: self.allocations.values().flatten().copied().collect(),
            critical_path: self.schedule.critical_path.clone(),
            project_finish: self.schedule.project_finish,
        }
    }

    fn check_fact(
        &self,
        fact_id: NodeId,
        inputs: &AllocationInputs,
    ) -> Result<(), RecalculationError> {
        let Some(node) = self.graph.node(fact_id) else {
            return Err(RecalculationError::InvalidFact {
                fact_id,
                reason: "no such node".to_string(),
            });
        };
        if node.kind != NodeKind::BudgetItem {
            return Err(RecalculationError::InvalidFact {
                fact_id,
                reason: "allocation inputs attach to budget items only".to_string(),
            });
        }
        self.catalog.get(&inputs.curve_id)?;
        Ok(())
    }

    fn detach_fact(&mut self, fact_id: NodeId) -> bool {
        let had_inputs = self.facts.remove(&fact_id).is_some();
        let had_rows = self.allocations.remove(&fact_id).is_some();
        had_inputs || had_rows
    }
}
