use super::{PersistenceResult, ProjectStore};
use crate::project::{ProjectId, ProjectSnapshot};
use crate::recalculation::AuditRecord;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Committed {
    snapshots: HashMap<ProjectId, ProjectSnapshot>,
    audit: Vec<AuditRecord>,
}

/// Keeps committed state in process memory.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    committed: Mutex<Committed>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every audit record committed for `project_id`, oldest first.
    pub fn audit_records(&self, project_id: ProjectId) -> Vec<AuditRecord> {
        self.committed
            .lock()
            .audit
            .iter()
            .filter(|record| record.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn commit_count(&self) -> usize {
        self.committed.lock().audit.len()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn commit(&self, snapshot: &ProjectSnapshot, audit: &AuditRecord) -> PersistenceResult<()> {
        super::validate_snapshot(snapshot)?;
        let mut committed = self.committed.lock();
        committed
            .snapshots
            .insert(snapshot.project_id, snapshot.clone());
        committed.audit.push(audit.clone());
        Ok(())
    }

    fn load(&self, project_id: ProjectId) -> PersistenceResult<Option<ProjectSnapshot>> {
        Ok(self.committed.lock().snapshots.get(&project_id).cloned())
    }
}
