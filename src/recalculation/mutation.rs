use crate::project::AllocationInputs;
use serde::{Deserialize, Serialize};
use std::fmt;
use timeline_core::{DependencyEdge, NodeId, Period, ScheduleNode};

/// A single host edit applied by [`super::TimelineEngine::recalculate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddNode {
        node: ScheduleNode,
    },
    RemoveNode {
        node_id: NodeId,
        /// Also drop every edge that references the node.
        #[serde(default)]
        cascade: bool,
    },
    AddEdge {
        edge: DependencyEdge,
    },
    RemoveEdge {
        predecessor: NodeId,
        successor: NodeId,
    },
    SetDuration {
        node_id: NodeId,
        duration: Period,
    },
    SetLag {
        predecessor: NodeId,
        successor: NodeId,
        lag: Period,
    },
    /// Locking pins the node at `start`, falling back to its baseline start
    /// and then to its current early start.
    SetBaselineLock {
        node_id: NodeId,
        locked: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<Period>,
    },
    /// `None` detaches the fact's allocation inputs and drops its rows.
    SetAllocationInputs {
        fact_id: NodeId,
        inputs: Option<AllocationInputs>,
    },
    /// Recompute without a structural change.
    Refresh,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddNode { .. } => "add_node",
            Mutation::RemoveNode { .. } => "remove_node",
            Mutation::AddEdge { .. } => "add_edge",
            Mutation::RemoveEdge { .. } => "remove_edge",
            Mutation::SetDuration { .. } => "set_duration",
            Mutation::SetLag { .. } => "set_lag",
            Mutation::SetBaselineLock { .. } => "set_baseline_lock",
            Mutation::SetAllocationInputs { .. } => "set_allocation_inputs",
            Mutation::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddNode { node } => write!(f, "add_node({})", node.id),
            Mutation::RemoveNode { node_id, cascade } => {
                write!(f, "remove_node({node_id}, cascade={cascade})")
            }
            Mutation::AddEdge { edge } => write!(f, "add_edge({})", edge.key()),
            Mutation::RemoveEdge {
                predecessor,
                successor,
            } => write!(f, "remove_edge({predecessor}->{successor})"),
            Mutation::SetDuration { node_id, duration } => {
                write!(f, "set_duration({node_id}, {duration})")
            }
            Mutation::SetLag {
                predecessor,
                successor,
                lag,
            } => write!(f, "set_lag({predecessor}->{successor}, {lag})"),
            Mutation::SetBaselineLock {
                node_id, locked, ..
            } => write!(f, "set_baseline_lock({node_id}, {locked})"),
            Mutation::SetAllocationInputs { fact_id, .. } => {
                write!(f, "set_allocation_inputs({fact_id})")
            }
            Mutation::Refresh => f.write_str("refresh"),
        }
    }
}
