//! Evidence payloads for the tutor: a compact description of the
//! neighbourhood around each node that matches a free-text question.

use crate::model::{VisualGraph, VisualNode};
use graphdesk_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    In,
    Out,
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => f.write_str("in"),
            Self::Out => f.write_str("out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceLink {
    pub neighbor_id: NodeId,
    pub neighbor_name: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(rename = "dir")]
    pub direction: LinkDirection,
    pub rel_id: EdgeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub focus_id: NodeId,
    pub focus: String,
    pub neighbors: Vec<String>,
    pub relations: Vec<String>,
    pub links: Vec<EvidenceLink>,
    pub concepts: Vec<String>,
    pub skills: Vec<String>,
    pub tasks: Vec<String>,
    pub competencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceBuilder {
    pub max_foci: usize,
    pub max_neighbors: usize,
    pub max_relations: usize,
    pub max_links: usize,
    pub max_per_category: usize,
}

impl Default for EvidenceBuilder {
    fn default() -> Self {
        Self {
            max_foci: 3,
            max_neighbors: 20,
            max_relations: 20,
            max_links: 30,
            max_per_category: 5,
        }
    }
}

fn push_distinct(items: &mut Vec<String>, item: &str, cap: usize) {
    if items.len() < cap && !item.is_empty() && !items.iter().any(|i| i == item) {
        items.push(item.to_string());
    }
}

impl EvidenceBuilder {
    /// Named nodes whose name contains `query`, ignoring case. Nodes labelled
    /// only by their label set or id never match.
    pub fn foci<'a>(&self, graph: &'a VisualGraph, query: &str) -> Vec<&'a VisualNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        graph
            .nodes
            .iter()
            .filter(|n| !n.unnamed && n.label.to_lowercase().contains(&needle))
            .take(self.max_foci)
            .collect()
    }

    pub fn build(&self, graph: &VisualGraph, query: &str) -> Vec<EvidenceRecord> {
        self.foci(graph, query)
            .into_iter()
            .map(|focus| self.record_for(graph, focus))
            .collect()
    }

    pub fn for_node(&self, graph: &VisualGraph, id: &NodeId) -> Option<EvidenceRecord> {
        graph.node(id).map(|focus| self.record_for(graph, focus))
    }

    fn record_for(&self, graph: &VisualGraph, focus: &VisualNode) -> EvidenceRecord {
        let mut record = EvidenceRecord {
            focus_id: focus.id.clone(),
            focus: focus.label.clone(),
            neighbors: Vec::new(),
            relations: Vec::new(),
            links: Vec::new(),
            concepts: Vec::new(),
            skills: Vec::new(),
            tasks: Vec::new(),
            competencies: Vec::new(),
        };

        for edge in graph.incident_edges(&focus.id) {
            let (other_id, direction) = if edge.from == focus.id {
                (&edge.to, LinkDirection::Out)
            } else {
                (&edge.from, LinkDirection::In)
            };
            let Some(other) = graph.node(other_id) else {
                continue;
            };

            push_distinct(&mut record.relations, &edge.label, self.max_relations);
            push_distinct(&mut record.neighbors, &other.label, self.max_neighbors);
            if record.links.len() < self.max_links {
                record.links.push(EvidenceLink {
                    neighbor_id: other.id.clone(),
                    neighbor_name: other.label.clone(),
                    rel_type: edge.label.clone(),
                    direction,
                    rel_id: edge.id.clone(),
                });
            }

            let cap = self.max_per_category;
            for label in &other.labels {
                match label.as_str() {
                    "Concept" => push_distinct(&mut record.concepts, &other.label, cap),
                    "Skill" => push_distinct(&mut record.skills, &other.label, cap),
                    "Task" => push_distinct(&mut record.tasks, &other.label, cap),
                    "Competency" => push_distinct(&mut record.competencies, &other.label, cap),
                    _ => {}
                }
            }
        }

        record
    }
}

/// Prompt text for a set of evidence records, one paragraph per focus.
pub fn render_evidence_text(records: &[EvidenceRecord]) -> String {
    records
        .iter()
        .map(|e| {
            let mut lines = vec![format!("Topic: {}", e.focus)];
            if !e.neighbors.is_empty() {
                lines.push(format!("Related nodes: {}", e.neighbors.join(", ")));
            }
            if !e.links.is_empty() {
                let links: Vec<String> = e
                    .links
                    .iter()
                    .map(|l| format!("{}:{} → {} [{}]", l.rel_type, l.direction, l.neighbor_name, l.neighbor_id))
                    .collect();
                lines.push(format!("Links: {}", links.join(" | ")));
            }
            if !e.relations.is_empty() {
                lines.push(format!("Relations: {}", e.relations.join(", ")));
            }
            for (heading, items) in [
                ("Concepts", &e.concepts),
                ("Skills", &e.skills),
                ("Tasks", &e.tasks),
                ("Competencies", &e.competencies),
            ] {
                if !items.is_empty() {
                    lines.push(format!("{heading}: {}", items.join(", ")));
                }
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
