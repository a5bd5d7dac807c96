use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer period count since the project epoch. Durations and lags use the same unit.
pub type Period = i64;

/// Stable identifier of a schedulable node, assigned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Milestone,
    BudgetItem,
}

/// How the dates of two linked nodes constrain each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::FinishToStart => "FS",
            RelationKind::StartToStart => "SS",
            RelationKind::FinishToFinish => "FF",
            RelationKind::StartToFinish => "SF",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FS" | "FINISH_TO_START" => Some(RelationKind::FinishToStart),
            "SS" | "START_TO_START" => Some(RelationKind::StartToStart),
            "FF" | "FINISH_TO_FINISH" => Some(RelationKind::FinishToFinish),
            "SF" | "START_TO_FINISH" => Some(RelationKind::StartToFinish),
            _ => None,
        }
    }

    /// Whether the constraint binds the successor's finish rather than its start.
    pub fn constrains_finish(&self) -> bool {
        matches!(
            self,
            RelationKind::FinishToFinish | RelationKind::StartToFinish
        )
    }

    /// Whether the constraint is measured from the predecessor's finish.
    pub fn from_finish(&self) -> bool {
        matches!(
            self,
            RelationKind::FinishToStart | RelationKind::FinishToFinish
        )
    }
}

/// Ordered (predecessor, successor) pair identifying an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub predecessor: NodeId,
    pub successor: NodeId,
}

impl EdgeKey {
    pub fn new(predecessor: NodeId, successor: NodeId) -> Self {
        Self {
            predecessor,
            successor,
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.predecessor, self.successor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub predecessor: NodeId,
    pub successor: NodeId,
    #[serde(default)]
    pub kind: RelationKind,
    /// Signed offset in periods; negative values model lead time.
    #[serde(default)]
    pub lag: Period,
}

impl DependencyEdge {
    pub fn new(predecessor: NodeId, successor: NodeId, kind: RelationKind, lag: Period) -> Self {
        Self {
            predecessor,
            successor,
            kind,
            lag,
        }
    }

    pub fn finish_to_start(predecessor: NodeId, successor: NodeId) -> Self {
        Self::new(predecessor, successor, RelationKind::FinishToStart, 0)
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.predecessor, self.successor)
    }
}

/// Dates produced by the CPM scheduler. Only the scheduler writes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedDates {
    pub early_start: Period,
    pub early_finish: Period,
    pub late_start: Period,
    pub late_finish: Period,
    pub total_float: Period,
    pub is_critical: bool,
}

/// A milestone or budget line item that participates in timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    pub duration: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_start: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_end: Option<Period>,
    #[serde(default)]
    pub is_baseline_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    computed: Option<ComputedDates>,
}

impl ScheduleNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, duration: Period) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Milestone,
            duration,
            baseline_start: None,
            baseline_end: None,
            is_baseline_locked: false,
            computed: None,
        }
    }

    pub fn budget_item(id: impl Into<NodeId>, name: impl Into<String>, duration: Period) -> Self {
        Self {
            kind: NodeKind::BudgetItem,
            ..Self::new(id, name, duration)
        }
    }

    pub fn with_baseline_start(mut self, start: Period) -> Self {
        self.baseline_start = Some(start);
        self
    }

    pub fn locked_at(mut self, start: Period) -> Self {
        self.baseline_start = Some(start);
        self.is_baseline_locked = true;
        self
    }

    pub fn computed(&self) -> Option<&ComputedDates> {
        self.computed.as_ref()
    }

    pub fn early_start(&self) -> Option<Period> {
        self.computed.map(|c| c.early_start)
    }

    pub fn early_finish(&self) -> Option<Period> {
        self.computed.map(|c| c.early_finish)
    }

    pub fn late_start(&self) -> Option<Period> {
        self.computed.map(|c| c.late_start)
    }

    pub fn late_finish(&self) -> Option<Period> {
        self.computed.map(|c| c.late_finish)
    }

    pub fn total_float(&self) -> Option<Period> {
        self.computed.map(|c| c.total_float)
    }

    pub fn is_critical(&self) -> bool {
        self.computed.map(|c| c.is_critical).unwrap_or(false)
    }

    /// Number of periods the node occupies on the timeline. A locked node with
    /// both baseline dates keeps the span the user pinned.
    pub fn span(&self) -> Period {
        match (self.is_baseline_locked, self.baseline_start, self.baseline_end) {
            (true, Some(start), Some(end)) => end - start,
            _ => self.duration,
        }
    }

    pub(crate) fn set_computed(&mut self, dates: ComputedDates) {
        self.computed = Some(dates);
    }

    pub(crate) fn clear_computed(&mut self) {
        self.computed = None;
    }
}
