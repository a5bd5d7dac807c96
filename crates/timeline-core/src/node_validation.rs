use crate::node::{DependencyEdge, ScheduleNode};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeValidationError {
    message: String,
}

impl NodeValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NodeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NodeValidationError {}

pub fn validate_node(node: &ScheduleNode) -> Result<(), NodeValidationError> {
    if node.duration < 0 {
        return Err(NodeValidationError::new(format!(
            "node {} has negative duration {}",
            node.id, node.duration
        )));
    }

    if let (Some(start), Some(end)) = (node.baseline_start, node.baseline_end) {
        if end < start {
            return Err(NodeValidationError::new(format!(
                "node {} baseline end {} precedes baseline start {}",
                node.id, end, start
            )));
        }
        if end.checked_sub(start).is_none() {
            return Err(NodeValidationError::new(format!(
                "node {} baseline span overflows",
                node.id
            )));
        }
    }

    if node.is_baseline_locked && node.baseline_start.is_none() {
        return Err(NodeValidationError::new(format!(
            "node {} is baseline-locked but has no baseline start",
            node.id
        )));
    }

    Ok(())
}

pub fn validate_edge(edge: &DependencyEdge) -> Result<(), NodeValidationError> {
    // Self-loops are left to the cycle detector, which reports them as a cycle.
    if edge.lag.checked_abs().is_none() {
        return Err(NodeValidationError::new(format!(
            "edge {} has an unrepresentable lag",
            edge.key()
        )));
    }
    Ok(())
}
