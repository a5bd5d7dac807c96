use super::mutation::Mutation;
use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use timeline_core::{NodeId, ScheduleWarning};

/// What one committed unit of work changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub project_id: ProjectId,
    pub recorded_at: DateTime<Utc>,
    /// `None` for the record written when the project is first loaded.
    pub mutation: Option<Mutation>,
    pub rescheduled_nodes: Vec<NodeId>,
    pub regenerated_facts: Vec<NodeId>,
    pub removed_facts: Vec<NodeId>,
    pub previous_critical_path: Vec<NodeId>,
    pub critical_path: Vec<NodeId>,
    pub warnings: Vec<ScheduleWarning>,
}

impl AuditRecord {
    pub fn critical_path_changed(&self) -> bool {
        self.previous_critical_path != self.critical_path
    }
}

/// Bounded in-memory audit trail; the oldest records are evicted first.
#[derive(Debug, Clone)]
pub(crate) struct AuditLog {
    records: VecDeque<AuditRecord>,
    capacity: usize,
}

impl AuditLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, record: AuditRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub(crate) fn to_vec(&self) -> Vec<AuditRecord> {
        self.records.iter().cloned().collect()
    }
}
