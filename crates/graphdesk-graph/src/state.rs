use crate::model::{VisualEdge, VisualGraph, VisualNode};
use graphdesk_core::{EdgeId, MasteryStatus, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Node {0} is not in the graph")]
    UnknownNode(NodeId),
    #[error("Edge {0} is not in the graph")]
    UnknownEdge(EdgeId),
    #[error("Node {0} is already in the graph")]
    DuplicateNode(NodeId),
    #[error("Edge {0} is already in the graph")]
    DuplicateEdge(EdgeId),
    #[error("Edge {edge} references missing node {node}")]
    MissingEndpoint { edge: EdgeId, node: NodeId },
}

/// The visual graph currently on screen.
///
/// Operations consume the state and hand back a new one; `revision` bumps on
/// every applied change so callers can tell whether anything happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphState {
    graph: VisualGraph,
    revision: u64,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: VisualGraph) -> Self {
        Self { graph, revision: 0 }
    }

    pub fn graph(&self) -> &VisualGraph {
        &self.graph
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    fn bumped(mut self) -> Self {
        self.revision += 1;
        self
    }

    /// Full reset, used when a new query replaces the canvas.
    pub fn replaced(self, graph: VisualGraph) -> Self {
        Self {
            graph,
            revision: self.revision,
        }
        .bumped()
    }

    pub(crate) fn extended(mut self, nodes: Vec<VisualNode>, edges: Vec<VisualEdge>) -> Self {
        self.graph.nodes.extend(nodes);
        self.graph.edges.extend(edges);
        self.bumped()
    }

    pub fn with_node(mut self, node: VisualNode) -> Result<Self, EditError> {
        if self.graph.contains_node(&node.id) {
            return Err(EditError::DuplicateNode(node.id));
        }
        self.graph.nodes.push(node);
        Ok(self.bumped())
    }

    pub fn renamed(mut self, id: &NodeId, label: impl Into<String>) -> Result<Self, EditError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EditError::UnknownNode(id.clone()))?;
        node.label = label.into();
        node.unnamed = false;
        Ok(self.bumped())
    }

    pub fn with_status(
        mut self,
        id: &NodeId,
        status: Option<MasteryStatus>,
    ) -> Result<Self, EditError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EditError::UnknownNode(id.clone()))?;
        node.status = status;
        Ok(self.bumped())
    }

    /// Removes the node together with every edge touching it.
    pub fn without_node(mut self, id: &NodeId) -> Result<Self, EditError> {
        let before = self.graph.nodes.len();
        self.graph.nodes.retain(|n| &n.id != id);
        if self.graph.nodes.len() == before {
            return Err(EditError::UnknownNode(id.clone()));
        }
        self.graph.edges.retain(|e| !e.touches(id));
        Ok(self.bumped())
    }

    pub fn with_edge(mut self, edge: VisualEdge) -> Result<Self, EditError> {
        if self.graph.contains_edge(&edge.id) {
            return Err(EditError::DuplicateEdge(edge.id));
        }
        for endpoint in [&edge.from, &edge.to] {
            if !self.graph.contains_node(endpoint) {
                return Err(EditError::MissingEndpoint {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        self.graph.edges.push(edge);
        Ok(self.bumped())
    }

    pub fn without_edge(mut self, id: &EdgeId) -> Result<Self, EditError> {
        let before = self.graph.edges.len();
        self.graph.edges.retain(|e| &e.id != id);
        if self.graph.edges.len() == before {
            return Err(EditError::UnknownEdge(id.clone()));
        }
        Ok(self.bumped())
    }

    /// Marks `focus` mastered and each node in `unlocked` in progress. Ids not
    /// on screen are ignored.
    pub fn with_mastery(mut self, focus: &NodeId, unlocked: &[NodeId]) -> Self {
        for node in &mut self.graph.nodes {
            if &node.id == focus {
                node.status = Some(MasteryStatus::Mastered);
            } else if unlocked.contains(&node.id) {
                node.status = Some(MasteryStatus::InProgress);
            }
        }
        self.bumped()
    }
}
