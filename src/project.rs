//! Host-facing project payloads: what a host loads, and what gets committed.

use serde::{Deserialize, Serialize};
use std::fmt;
use timeline_core::{DependencyEdge, NodeId, Period, ProjectSettings, ScheduleNode};
use timeline_cost::{AllocationRow, CurveDefinition, Money, Steepness};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Money, curve and steepness attached to a budget-item node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationInputs {
    pub total: Money,
    pub curve_id: String,
    #[serde(default)]
    pub steepness: Steepness,
}

impl AllocationInputs {
    pub fn new(total: Money, curve_id: impl Into<String>, steepness: Steepness) -> Self {
        Self {
            total,
            curve_id: curve_id.into(),
            steepness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactInputs {
    pub fact_id: NodeId,
    pub inputs: AllocationInputs,
}

/// Everything a host supplies to start managing a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLoad {
    pub project_id: ProjectId,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub nodes: Vec<ScheduleNode>,
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
    #[serde(default)]
    pub facts: Vec<FactInputs>,
    /// Custom curve definitions, added to the built-in shapes.
    #[serde(default)]
    pub curves: Vec<CurveDefinition>,
}

impl ProjectLoad {
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            settings: ProjectSettings::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            facts: Vec::new(),
            curves: Vec::new(),
        }
    }
}

/// Full committed state of one project.
///
/// Collections are stored in ascending id order so equal states serialize to
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_id: ProjectId,
    /// Sequence number of the audit record committed with this snapshot.
    pub sequence: u64,
    pub settings: ProjectSettings,
    pub nodes: Vec<ScheduleNode>,
    pub edges: Vec<DependencyEdge>,
    pub facts: Vec<FactInputs>,
    pub curves: Vec<CurveDefinition>,
    pub allocations: Vec<AllocationRow>,
    pub critical_path: Vec<NodeId>,
    pub project_finish: Period,
}

impl ProjectSnapshot {
    pub fn allocations_for(&self, fact_id: NodeId) -> impl Iterator<Item = &AllocationRow> + '_ {
        self.allocations.iter().filter(move |row| row.fact_id == fact_id)
    }
}

impl From<ProjectSnapshot> for ProjectLoad {
    fn from(snapshot: ProjectSnapshot) -> Self {
        Self {
            project_id: snapshot.project_id,
            settings: snapshot.settings,
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            facts: snapshot.facts,
            curves: snapshot.curves,
        }
    }
}
