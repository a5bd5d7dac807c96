use crate::error::CycleDetectedError;
use crate::graph::ProjectGraph;
use crate::node::{EdgeKey, NodeId};
use std::collections::HashMap;
use tracing::debug;

/// Node ids in dependency order: every predecessor precedes its successors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopologicalOrder(Vec<NodeId>);

impl TopologicalOrder {
    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

struct Frame {
    node: NodeId,
    successors: Vec<NodeId>,
    next: usize,
}

/// Confirms the graph is acyclic and returns a topological order.
///
/// Iterative depth-first search with three-colour marking (absent from the
/// map = unvisited). Roots and successors are visited in ascending id order so
/// both the order and any reported cycle are deterministic. Runs in O(V + E).
pub fn validate(graph: &ProjectGraph) -> Result<TopologicalOrder, CycleDetectedError> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::with_capacity(graph.node_count());
    let mut post_order: Vec<NodeId> = Vec::with_capacity(graph.node_count());

    for root in graph.node_ids() {
        if marks.contains_key(&root) {
            continue;
        }
        let mut stack = vec![open_frame(graph, root)];
        marks.insert(root, Mark::InProgress);

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.successors.len() {
                let successor = frame.successors[frame.next];
                frame.next += 1;
                match marks.get(&successor) {
                    None => {
                        marks.insert(successor, Mark::InProgress);
                        stack.push(open_frame(graph, successor));
                    }
                    Some(Mark::InProgress) => {
                        let offending_edges = cycle_from_stack(&stack, successor);
                        debug!(edges = offending_edges.len(), "dependency cycle detected");
                        return Err(CycleDetectedError { offending_edges });
                    }
                    Some(Mark::Done) => {}
                }
            } else {
                let node = frame.node;
                stack.pop();
                marks.insert(node, Mark::Done);
                post_order.push(node);
            }
        }
    }

    post_order.reverse();
    debug!(nodes = post_order.len(), "dependency graph validated");
    Ok(TopologicalOrder(post_order))
}

fn open_frame(graph: &ProjectGraph, node: NodeId) -> Frame {
    Frame {
        node,
        successors: graph.neighbors_out(node).unwrap_or_default(),
        next: 0,
    }
}

/// Walks the traversal stack from the re-entered node to the top, closing the
/// loop with the edge that hit the in-progress node.
fn cycle_from_stack(stack: &[Frame], reentered: NodeId) -> Vec<EdgeKey> {
    let start = stack
        .iter()
        .position(|frame| frame.node == reentered)
        .unwrap_or(0);
    let path: Vec<NodeId> = stack[start..].iter().map(|frame| frame.node).collect();
    let mut edges: Vec<EdgeKey> = path
        .windows(2)
        .map(|pair| EdgeKey::new(pair[0], pair[1]))
        .collect();
    if let Some(last) = path.last() {
        edges.push(EdgeKey::new(*last, reentered));
    }
    edges
}
