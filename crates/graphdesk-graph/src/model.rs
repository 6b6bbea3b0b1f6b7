use graphdesk_core::{EdgeId, MasteryStatus, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    pub id: NodeId,
    pub label: String,
    pub group: String,
    /// Original label set, kept so the node can be re-filtered and re-tiered.
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MasteryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// The label fell back to the label set or the id; no name property.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unnamed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl VisualNode {
    pub fn new(id: NodeId, label: impl Into<String>, group: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            id,
            label: label.into(),
            group: group.into(),
            labels,
            status: None,
            level: None,
            x: None,
            y: None,
            unnamed: false,
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Relationship type.
    pub label: String,
}

impl VisualEdge {
    /// Identity for a relationship the database did not identify.
    pub fn synthesized_id(from: &NodeId, to: &NodeId, rel_type: &str) -> EdgeId {
        EdgeId(format!("{from}-{to}-{rel_type}"))
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.from == node || &self.to == node
    }
}

/// The node/edge model handed to the rendering sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut VisualNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&VisualEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges incident to `id`, in either direction.
    pub fn incident_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a VisualEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Distinct groups in first-seen node order.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.nodes
            .iter()
            .map(|n| n.group.as_str())
            .filter(|g| seen.insert(*g))
            .collect()
    }
}

/// Active label and relationship-type restrictions. Empty sets restrict nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub labels: BTreeSet<String>,
    pub rel_types: BTreeSet<String>,
}

impl FilterState {
    pub fn new<L, T>(labels: L, rel_types: T) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            rel_types: rel_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.labels.is_empty() && self.rel_types.is_empty()
    }

    pub fn label_filter_active(&self) -> bool {
        !self.labels.is_empty()
    }

    /// True when the label filter is empty or shares a label with `labels`.
    pub fn admits_labels(&self, labels: &[String]) -> bool {
        self.labels.is_empty() || labels.iter().any(|l| self.labels.contains(l))
    }

    pub fn admits_type(&self, rel_type: &str) -> bool {
        self.rel_types.is_empty() || self.rel_types.contains(rel_type)
    }
}
