use crate::error::GraphError;
use crate::node::{DependencyEdge, EdgeKey, NodeId, Period, ScheduleNode};
use crate::node_validation;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Schedulable nodes and their dependency edges.
///
/// Storage is an index arena: removing a node or edge tombstones its slot and
/// leaves every other index valid, and traversals walk indices rather than
/// references. Host-facing lookups go through the stable [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    graph: StableDiGraph<ScheduleNode, DependencyEdge>,
    id_to_index: HashMap<NodeId, NodeIndex>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from host-supplied node and edge sets.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = ScheduleNode>,
        edges: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, mut node: ScheduleNode) -> Result<(), GraphError> {
        node_validation::validate_node(&node)
            .map_err(|err| GraphError::InvalidNode(err.to_string()))?;
        if self.id_to_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        node.clear_computed();
        let id = node.id;
        let index = self.graph.add_node(node);
        self.id_to_index.insert(id, index);
        Ok(())
    }

    /// Removes a node. Without `cascade` the node must not be referenced by any edge.
    pub fn remove_node(&mut self, id: NodeId, cascade: bool) -> Result<ScheduleNode, GraphError> {
        let index = self.index_of(id)?;
        let edge_count = self.graph.edges_directed(index, Direction::Outgoing).count()
            + self.graph.edges_directed(index, Direction::Incoming).count();
        if edge_count > 0 && !cascade {
            return Err(GraphError::NodeInUse {
                node_id: id,
                edge_count,
            });
        }
        self.id_to_index.remove(&id);
        // StableGraph drops the node's edges along with it.
        self.graph.remove_node(index).ok_or(GraphError::UnknownNode(id))
    }

    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<(), GraphError> {
        node_validation::validate_edge(&edge)
            .map_err(|err| GraphError::InvalidNode(err.to_string()))?;
        let from = self.index_of(edge.predecessor)?;
        let to = self.index_of(edge.successor)?;
        if self.graph.find_edge(from, to).is_some() {
            return Err(GraphError::DuplicateEdge(edge.key()));
        }
        self.graph.add_edge(from, to, edge);
        Ok(())
    }

    pub fn remove_edge(
        &mut self,
        predecessor: NodeId,
        successor: NodeId,
    ) -> Result<DependencyEdge, GraphError> {
        let edge_index = self.edge_index(predecessor, successor)?;
        self.graph
            .remove_edge(edge_index)
            .ok_or(GraphError::UnknownEdge(EdgeKey::new(predecessor, successor)))
    }

    pub fn set_lag(
        &mut self,
        predecessor: NodeId,
        successor: NodeId,
        lag: Period,
    ) -> Result<(), GraphError> {
        let edge_index = self.edge_index(predecessor, successor)?;
        let key = EdgeKey::new(predecessor, successor);
        let edge = self
            .graph
            .edge_weight_mut(edge_index)
            .ok_or(GraphError::UnknownEdge(key))?;
        let mut updated = edge.clone();
        updated.lag = lag;
        node_validation::validate_edge(&updated)
            .map_err(|err| GraphError::InvalidNode(err.to_string()))?;
        *edge = updated;
        Ok(())
    }

    pub fn set_duration(&mut self, id: NodeId, duration: Period) -> Result<(), GraphError> {
        self.update_node(id, |node| node.duration = duration)
    }

    /// Applies a host edit to a node and re-validates it; the node is left
    /// untouched when the edit is invalid.
    pub fn update_node<F>(&mut self, id: NodeId, mutator: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut ScheduleNode),
    {
        let index = self.index_of(id)?;
        let node = self
            .graph
            .node_weight_mut(index)
            .ok_or(GraphError::UnknownNode(id))?;
        let mut updated = node.clone();
        mutator(&mut updated);
        updated.id = id;
        node_validation::validate_node(&updated)
            .map_err(|err| GraphError::InvalidNode(err.to_string()))?;
        *node = updated;
        Ok(())
    }

    /// Successor ids in ascending order.
    pub fn neighbors_out(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self
            .outgoing_edges(id)?
            .into_iter()
            .map(|edge| edge.successor)
            .collect())
    }

    /// Predecessor ids in ascending order.
    pub fn neighbors_in(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self
            .incoming_edges(id)?
            .into_iter()
            .map(|edge| edge.predecessor)
            .collect())
    }

    /// Outgoing edges ordered by successor id.
    pub fn outgoing_edges(&self, id: NodeId) -> Result<Vec<&DependencyEdge>, GraphError> {
        let index = self.index_of(id)?;
        let mut edges: Vec<&DependencyEdge> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| edge.weight())
            .collect();
        edges.sort_by_key(|edge| edge.successor);
        Ok(edges)
    }

    /// Incoming edges ordered by predecessor id.
    pub fn incoming_edges(&self, id: NodeId) -> Result<Vec<&DependencyEdge>, GraphError> {
        let index = self.index_of(id)?;
        let mut edges: Vec<&DependencyEdge> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| edge.weight())
            .collect();
        edges.sort_by_key(|edge| edge.predecessor);
        Ok(edges)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&ScheduleNode> {
        self.id_to_index
            .get(&id)
            .and_then(|index| self.graph.node_weight(*index))
    }

    pub fn edge(&self, predecessor: NodeId, successor: NodeId) -> Option<&DependencyEdge> {
        self.edge_index(predecessor, successor)
            .ok()
            .and_then(|index| self.graph.edge_weight(index))
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.id_to_index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> Vec<&ScheduleNode> {
        self.node_ids()
            .into_iter()
            .filter_map(|id| self.node(id))
            .collect()
    }

    /// Edges in ascending (predecessor, successor) order.
    pub fn edges(&self) -> Vec<&DependencyEdge> {
        let mut edges: Vec<&DependencyEdge> = self
            .graph
            .edge_indices()
            .filter_map(|index| self.graph.edge_weight(index))
            .collect();
        edges.sort_by_key(|edge| edge.key());
        edges
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut ScheduleNode> {
        let index = *self.id_to_index.get(&id)?;
        self.graph.node_weight_mut(index)
    }

    fn index_of(&self, id: NodeId) -> Result<NodeIndex, GraphError> {
        self.id_to_index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownNode(id))
    }

    fn edge_index(&self, predecessor: NodeId, successor: NodeId) -> Result<EdgeIndex, GraphError> {
        let from = self.index_of(predecessor)?;
        let to = self.index_of(successor)?;
        self.graph
            .find_edge(from, to)
            .ok_or(GraphError::UnknownEdge(EdgeKey::new(predecessor, successor)))
    }
}
