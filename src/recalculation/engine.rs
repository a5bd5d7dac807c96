use super::audit::{AuditLog, AuditRecord};
use super::error::RecalculationError;
use super::model::ProjectModel;
use super::mutation::Mutation;
use crate::config::EngineConfig;
use crate::persistence::ProjectStore;
use crate::project::{ProjectId, ProjectLoad, ProjectSnapshot};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use timeline_core::{
    BaselineInfeasibleWarning, NodeId, NodeSchedule, Period, ScheduleResult, ScheduleWarning,
};
use timeline_cost::AllocationRow;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactAllocation {
    pub fact_id: NodeId,
    pub rows: Vec<AllocationRow>,
}

/// Outcome of one committed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalculationResult {
    pub project_id: ProjectId,
    /// Every node's computed dates, in topological order.
    pub nodes: Vec<NodeSchedule>,
    /// Nodes whose computed dates changed, in topological order.
    pub rescheduled_nodes: Vec<NodeId>,
    pub critical_path: Vec<NodeId>,
    pub project_finish: Period,
    /// New rows for every fact whose allocation was regenerated.
    pub allocations: Vec<FactAllocation>,
    pub removed_facts: Vec<NodeId>,
    pub warnings: Vec<ScheduleWarning>,
}

impl RecalculationResult {
    pub fn node(&self, id: NodeId) -> Option<&NodeSchedule> {
        self.nodes.iter().find(|schedule| schedule.id == id)
    }

    pub fn allocation(&self, fact_id: NodeId) -> Option<&[AllocationRow]> {
        self.allocations
            .iter()
            .find(|allocation| allocation.fact_id == fact_id)
            .map(|allocation| allocation.rows.as_slice())
    }

    pub fn baseline_warnings(&self) -> impl Iterator<Item = &BaselineInfeasibleWarning> + '_ {
        self.warnings.iter().filter_map(|warning| match warning {
            ScheduleWarning::BaselineInfeasible(inner) => Some(inner),
            ScheduleWarning::FinishConstraintMissed { .. } => None,
        })
    }
}

struct ProjectState {
    project_id: ProjectId,
    model: ProjectModel,
    audit: AuditLog,
    last_sequence: u64,
}

/// Owns the live state of every loaded project and serializes edits per project.
pub struct TimelineEngine {
    store: Arc<dyn ProjectStore>,
    config: EngineConfig,
    projects: RwLock<HashMap<ProjectId, Arc<Mutex<ProjectState>>>>,
    loading: Mutex<HashSet<ProjectId>>,
}

impl TimelineEngine {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn ProjectStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            projects: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates, schedules and allocates a host-supplied project, commits
    /// it, then registers it.
    pub fn load_project(
        &self,
        load: ProjectLoad,
    ) -> Result<RecalculationResult, RecalculationError> {
        let project_id = load.project_id;
        if self.projects.read().contains_key(&project_id) {
            return Err(RecalculationError::ProjectExists(project_id));
        }
        // The id stays reserved while the store commits, without holding the project map.
        if !self.loading.lock().insert(project_id) {
            return Err(RecalculationError::ProjectExists(project_id));
        }
        let outcome = self.load_reserved(project_id, load);
        self.loading.lock().remove(&project_id);
        outcome
    }

    fn load_reserved(
        &self,
        project_id: ProjectId,
        load: ProjectLoad,
    ) -> Result<RecalculationResult, RecalculationError> {
        let mut model = ProjectModel::from_load(load)?;
        model.reschedule()?;
        let regenerated = model.regenerate_allocations(None)?;

        if self.projects.read().contains_key(&project_id) {
            return Err(RecalculationError::ProjectExists(project_id));
        }
        let record = self.audit_record(project_id, 1, None, &model, None, regenerated, Vec::new());
        self.store.commit(&model.snapshot(project_id, 1), &record)?;

        let result = build_result(project_id, &model, &record);
        let mut audit = AuditLog::new(self.config.audit_log_capacity);
        audit.push(record);
        info!(
            project = %project_id,
            summary = %model.schedule.summary().to_log_summary(),
            "project loaded"
        );
        let state = ProjectState {
            project_id,
            model,
            audit,
            last_sequence: 1,
        };
        self.projects
            .write()
            .insert(project_id, Arc::new(Mutex::new(state)));
        Ok(result)
    }

    /// Rebuilds a project from its last committed snapshot without committing again.
    pub fn restore_project(
        &self,
        project_id: ProjectId,
    ) -> Result<RecalculationResult, RecalculationError> {
        if self.projects.read().contains_key(&project_id) {
            return Err(RecalculationError::ProjectExists(project_id));
        }
        let Some(snapshot) = self.store.load(project_id)? else {
            return Err(RecalculationError::UnknownProject(project_id));
        };
        let last_sequence = snapshot.sequence;
        let mut model = ProjectModel::from_load(ProjectLoad::from(snapshot))?;
        model.reschedule()?;
        let regenerated = model.regenerate_allocations(None)?;

        let record = self.audit_record(
            project_id,
            last_sequence,
            None,
            &model,
            None,
            regenerated,
            Vec::new(),
        );
        let result = build_result(project_id, &model, &record);

        let mut projects = self.projects.write();
        if projects.contains_key(&project_id) || self.loading.lock().contains(&project_id) {
            return Err(RecalculationError::ProjectExists(project_id));
        }
        info!(project = %project_id, sequence = last_sequence, "project restored");
        projects.insert(
            project_id,
            Arc::new(Mutex::new(ProjectState {
                project_id,
                model,
                audit: AuditLog::new(self.config.audit_log_capacity),
                last_sequence,
            })),
        );
        Ok(result)
    }

    /// Drops a project's in-memory state. Returns false when it was not loaded.
    pub fn unload_project(&self, project_id: ProjectId) -> bool {
        self.projects.write().remove(&project_id).is_some()
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn snapshot(&self, project_id: ProjectId) -> Result<ProjectSnapshot, RecalculationError> {
        let project = self.project(project_id)?;
        let state = project.lock();
        Ok(state.model.snapshot(project_id, state.last_sequence))
    }

    pub fn schedule(&self, project_id: ProjectId) -> Result<ScheduleResult, RecalculationError> {
        let project = self.project(project_id)?;
        let state = project.lock();
        Ok(state.model.schedule.clone())
    }

    /// Current rows of one fact; empty when the fact has no allocation inputs.
    pub fn allocations(
        &self,
        project_id: ProjectId,
        fact_id: NodeId,
    ) -> Result<Vec<AllocationRow>, RecalculationError> {
        let project = self.project(project_id)?;
        let state = project.lock();
        Ok(state
            .model
            .allocations
            .get(&fact_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Audit records retained in memory, oldest first.
    pub fn audit_log(&self, project_id: ProjectId) -> Result<Vec<AuditRecord>, RecalculationError> {
        let project = self.project(project_id)?;
        let state = project.lock();
        Ok(state.audit.to_vec())
    }

    /// Applies `mutation` under the configured default timeout, if any.
    pub fn recalculate(
        &self,
        project_id: ProjectId,
        mutation: Mutation,
    ) -> Result<RecalculationResult, RecalculationError> {
        let deadline = self
            .config
            .default_timeout()
            .map(|timeout| Instant::now() + timeout);
        self.run(project_id, mutation, deadline)
    }

    pub fn recalculate_with_deadline(
        &self,
        project_id: ProjectId,
        mutation: Mutation,
        deadline: Instant,
    ) -> Result<RecalculationResult, RecalculationError> {
        self.run(project_id, mutation, Some(deadline))
    }

    fn project(
        &self,
        project_id: ProjectId,
    ) -> Result<Arc<Mutex<ProjectState>>, RecalculationError> {
        self.projects
            .read()
            .get(&project_id)
            .cloned()
            .ok_or(RecalculationError::UnknownProject(project_id))
    }

    fn run(
        &self,
        project_id: ProjectId,
        mutation: Mutation,
        deadline: Option<Instant>,
    ) -> Result<RecalculationResult, RecalculationError> {
        let project = self.project(project_id)?;
        let mut state = project.lock();
        let outcome = self.recalculate_locked(&mut state, &mutation, deadline);
        if let Err(err) = &outcome {
            warn!(
                project = %project_id,
                mutation = %mutation,
                error = %err,
                retryable = err.is_retryable(),
                "mutation rejected"
            );
        }
        outcome
    }

    fn recalculate_locked(
        &self,
        state: &mut ProjectState,
        mutation: &Mutation,
        deadline: Option<Instant>,
    ) -> Result<RecalculationResult, RecalculationError> {
        let project_id = state.project_id;
        let mut working = state.model.clone();
        let removed_facts = working.apply(mutation)?;
        check_deadline(deadline, "apply")?;

        working.reschedule()?;
        check_deadline(deadline, "schedule")?;

        let regenerated = working.regenerate_allocations(Some(&state.model))?;
        check_deadline(deadline, "allocate")?;

        let sequence = state.last_sequence + 1;
        let record = self.audit_record(
            project_id,
            sequence,
            Some(mutation.clone()),
            &working,
            Some(&state.model),
            regenerated,
            removed_facts,
        );
        self.store.commit(&working.snapshot(project_id, sequence), &record)?;

        let result = build_result(project_id, &working, &record);
        info!(
            project = %project_id,
            sequence,
            mutation = mutation.name(),
            rescheduled = record.rescheduled_nodes.len(),
            regenerated = record.regenerated_facts.len(),
            summary = %working.schedule.summary().to_log_summary(),
            finish_date = ?working
                .settings
                .calendar()
                .start_date(working.schedule.project_finish),
            "recalculation committed"
        );
        state.model = working;
        state.last_sequence = sequence;
        state.audit.push(record);
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn audit_record(
        &self,
        project_id: ProjectId,
        sequence: u64,
        mutation: Option<Mutation>,
        model: &ProjectModel,
        previous: Option<&ProjectModel>,
        regenerated_facts: Vec<NodeId>,
        removed_facts: Vec<NodeId>,
    ) -> AuditRecord {
        AuditRecord {
            sequence,
            project_id,
            recorded_at: Utc::now(),
            mutation,
            rescheduled_nodes: model.rescheduled_since(previous),
            regenerated_facts,
            removed_facts,
            previous_critical_path: previous
                .map(|prev| prev.schedule.critical_path.clone())
                .unwrap_or_default(),
            critical_path: model.schedule.critical_path.clone(),
            warnings: model.schedule.warnings.clone(),
        }
    }
}

fn check_deadline(
    deadline: Option<Instant>,
    phase: &'static str,
) -> Result<(), RecalculationError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            debug!(phase, "recalculation deadline expired");
            Err(RecalculationError::Timeout { phase })
        }
        _ => Ok(()),
    }
}

fn build_result(
    project_id: ProjectId,
    model: &ProjectModel,
    record: &AuditRecord,
) -> RecalculationResult {
    let allocations = record
        .regenerated_facts
        .iter()
        .map(|&fact_id| FactAllocation {
            fact_id,
            rows: model.allocations.get(&fact_id).cloned().unwrap_or_default(),
        })
        .collect();
    RecalculationResult {
        project_id,
        nodes: model.schedule.nodes.clone(),
        rescheduled_nodes: record.rescheduled_nodes.clone(),
        critical_path: model.schedule.critical_path.clone(),
        project_finish: model.schedule.project_finish,
        allocations,
        removed_facts: record.removed_facts.clone(),
        warnings: model.schedule.warnings.clone(),
    }
}
