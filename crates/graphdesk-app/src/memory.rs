//! In-process graph store implementing [`QueryService`].
//!
//! Entities get element ids of the form `mem:{n}` plus the same `n` as their
//! legacy numeric identity, so both id strategies resolve. Used by the CLI
//! and by tests.

use crate::error::QueryError;
use crate::service::{CATALOG_FIELD, GraphQuery, QueryService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use graphdesk_core::{
    EdgeId, ElementRef, NodeId, Properties, PropertyValue, QueryResult, RawNode, RawRelationship,
    Record, RecordValue,
};
use graphdesk_graph::labels::LABEL_PROPERTIES;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use tracing::debug;

const ELEMENT_PREFIX: &str = "mem:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureNode {
    /// Name used by fixture relationships to refer to this node.
    pub key: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureRelationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Properties,
}

/// JSON description of a graph to seed the in-memory store with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub nodes: Vec<FixtureNode>,
    #[serde(default)]
    pub relationships: Vec<FixtureRelationship>,
}

#[derive(Debug, Clone)]
struct StoredNode {
    labels: Vec<String>,
    properties: Properties,
}

#[derive(Debug, Clone)]
struct StoredRel {
    rel_type: String,
    start: i64,
    end: i64,
    properties: Properties,
}

#[derive(Debug, Default)]
struct MemoryGraph {
    nodes: BTreeMap<i64, StoredNode>,
    rels: BTreeMap<i64, StoredRel>,
    next_id: i64,
}

fn element_ref(seq: i64) -> ElementRef {
    ElementRef::both(format!("{ELEMENT_PREFIX}{seq}"), seq)
}

/// Accepts `mem:{n}` as well as the bare legacy number.
fn parse_seq(id: &str) -> Option<i64> {
    id.strip_prefix(ELEMENT_PREFIX).unwrap_or(id).parse().ok()
}

fn matches_keyword(properties: &Properties, needle: &str) -> bool {
    LABEL_PROPERTIES.iter().any(|key| {
        properties
            .get(*key)
            .and_then(PropertyValue::as_text)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

impl MemoryGraph {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn raw_node(&self, seq: i64) -> Option<RawNode> {
        self.nodes.get(&seq).map(|node| RawNode {
            identity: element_ref(seq),
            labels: node.labels.clone(),
            properties: node.properties.clone(),
        })
    }

    fn raw_rel(&self, seq: i64) -> Option<RawRelationship> {
        self.rels.get(&seq).map(|rel| RawRelationship {
            identity: element_ref(seq),
            rel_type: rel.rel_type.clone(),
            start: element_ref(rel.start),
            end: element_ref(rel.end),
            properties: rel.properties.clone(),
        })
    }

    fn incident(&self, seq: i64) -> Vec<(i64, i64)> {
        self.rels
            .iter()
            .filter_map(|(&rid, rel)| {
                if rel.start == seq {
                    Some((rid, rel.end))
                } else if rel.end == seq {
                    Some((rid, rel.start))
                } else {
                    None
                }
            })
            .collect()
    }

    fn hop_rows(&self, seq: i64, limit: usize, rows: &mut Vec<Record>) {
        let Some(n) = self.raw_node(seq) else {
            return;
        };
        let incident = self.incident(seq);
        if incident.is_empty() {
            rows.push(Record::new().with("n", RecordValue::Node(n)));
            return;
        }
        for (rid, other) in incident {
            if rows.len() >= limit {
                return;
            }
            let r = self.raw_rel(rid).map_or(RecordValue::Null, RecordValue::Relationship);
            let m = self.raw_node(other).map_or(RecordValue::Null, RecordValue::Node);
            rows.push(
                Record::new()
                    .with("n", RecordValue::Node(n.clone()))
                    .with("r", r)
                    .with("m", m),
            );
        }
    }

    fn overview(&self, limit: usize) -> Vec<Record> {
        let mut rows = Vec::new();
        for &seq in self.nodes.keys().rev().take(limit) {
            self.hop_rows(seq, usize::MAX, &mut rows);
        }
        rows
    }

    fn neighbors(&self, id: &NodeId, limit: usize) -> Vec<Record> {
        let mut rows = Vec::new();
        if let Some(seq) = parse_seq(id.as_str()) {
            for (rid, other) in self.incident(seq).into_iter().take(limit) {
                let (Some(n), Some(r), Some(m)) =
                    (self.raw_node(seq), self.raw_rel(rid), self.raw_node(other))
                else {
                    continue;
                };
                rows.push(
                    Record::new()
                        .with("n", RecordValue::Node(n))
                        .with("r", RecordValue::Relationship(r))
                        .with("m", RecordValue::Node(m)),
                );
            }
        }
        rows
    }

    fn related(&self, id: &NodeId, labels: &[String], limit: usize) -> Vec<Record> {
        let Some((seq, n)) = parse_seq(id.as_str()).and_then(|seq| Some((seq, self.raw_node(seq)?)))
        else {
            return Vec::new();
        };
        let mut linked: Vec<i64> = Vec::new();
        for (_, other) in self.incident(seq) {
            if !linked.contains(&other) {
                linked.push(other);
            }
        }

        let mut rows = Vec::new();
        for label in labels {
            let matching = linked
                .iter()
                .filter_map(|&other| self.raw_node(other))
                .filter(|m| m.labels.contains(label))
                .take(limit);
            for m in matching {
                rows.push(
                    Record::new()
                        .with("n", RecordValue::Node(n.clone()))
                        .with("m", RecordValue::Node(m)),
                );
            }
        }
        if rows.is_empty() {
            rows.push(Record::new().with("n", RecordValue::Node(n)));
        }
        rows
    }

    fn find(&self, keyword: &str, label: Option<&str>) -> impl Iterator<Item = i64> + '_ {
        let needle = keyword.trim().to_lowercase();
        let label = label.map(str::to_string);
        self.nodes.iter().filter_map(move |(&seq, node)| {
            let label_ok = label.as_ref().is_none_or(|l| node.labels.contains(l));
            (label_ok && matches_keyword(&node.properties, &needle)).then_some(seq)
        })
    }

    /// Breadth-first enumeration of relationship-unique paths from the first
    /// node matching `keyword`.
    fn paths(&self, keyword: &str, depth: u32, limit: usize) -> Vec<Record> {
        let mut rows = Vec::new();
        let Some(start) = self.find(keyword, None).next() else {
            return rows;
        };

        let mut queue: VecDeque<(Vec<i64>, Vec<i64>)> = VecDeque::new();
        queue.push_back((vec![start], Vec::new()));

        while let Some((nodes, rels)) = queue.pop_front() {
            if rels.len() as u32 >= depth {
                continue;
            }
            let Some(&tail) = nodes.last() else {
                continue;
            };
            for (rid, other) in self.incident(tail) {
                if rels.contains(&rid) {
                    continue;
                }
                let mut next_nodes = nodes.clone();
                next_nodes.push(other);
                let mut next_rels = rels.clone();
                next_rels.push(rid);

                let ns = next_nodes.iter().filter_map(|&s| self.raw_node(s)).collect();
                let rs = next_rels.iter().filter_map(|&s| self.raw_rel(s)).collect();
                rows.push(
                    Record::new()
                        .with("ns", RecordValue::Nodes(ns))
                        .with("rs", RecordValue::Relationships(rs)),
                );
                if rows.len() >= limit {
                    return rows;
                }
                queue.push_back((next_nodes, next_rels));
            }
        }
        rows
    }

    fn catalog<I: IntoIterator<Item = String>>(values: I, limit: usize) -> Vec<Record> {
        values
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(limit)
            .map(|value| Record::new().with(CATALOG_FIELD, RecordValue::Scalar(value.into())))
            .collect()
    }

    fn run(&self, query: &GraphQuery) -> Vec<Record> {
        match query {
            GraphQuery::Overview { limit } => self.overview(*limit),
            GraphQuery::Neighbors { id, limit } => self.neighbors(id, *limit),
            GraphQuery::Paths {
                keyword,
                depth,
                limit,
            } => self.paths(keyword, *depth, *limit),
            GraphQuery::Search {
                keyword,
                label,
                limit,
            } => self
                .find(keyword, label.as_deref())
                .take(*limit)
                .filter_map(|seq| self.raw_node(seq))
                .map(|n| Record::new().with("n", RecordValue::Node(n)))
                .collect(),
            GraphQuery::Related { id, labels, limit } => self.related(id, labels, *limit),
            GraphQuery::LabelCatalog { limit } => Self::catalog(
                self.nodes.values().flat_map(|n| n.labels.iter().cloned()),
                *limit,
            ),
            GraphQuery::TypeCatalog { limit } => {
                Self::catalog(self.rels.values().map(|r| r.rel_type.clone()), *limit)
            }
        }
    }
}

pub struct MemoryGraphService {
    graph: Mutex<MemoryGraph>,
}

impl Default for MemoryGraphService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraphService {
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(MemoryGraph::default()),
        }
    }

    /// Seeds the store. Relationships naming an unknown key are skipped.
    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut graph = MemoryGraph::default();
        let mut keys: HashMap<String, i64> = HashMap::new();

        for node in fixture.nodes {
            let seq = graph.allocate();
            keys.insert(node.key, seq);
            graph.nodes.insert(
                seq,
                StoredNode {
                    labels: node.labels,
                    properties: node.properties,
                },
            );
        }
        for rel in fixture.relationships {
            let (Some(&start), Some(&end)) = (keys.get(&rel.from), keys.get(&rel.to)) else {
                debug!("Skipping fixture relationship {} -> {}", rel.from, rel.to);
                continue;
            };
            let seq = graph.allocate();
            graph.rels.insert(
                seq,
                StoredRel {
                    rel_type: rel.rel_type,
                    start,
                    end,
                    properties: rel.properties,
                },
            );
        }

        Self {
            graph: Mutex::new(graph),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json).context("Failed to parse graph fixture")?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn node_count(&self) -> usize {
        self.graph.lock().nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.graph.lock().rels.len()
    }

    fn node_seq(graph: &MemoryGraph, id: &NodeId) -> Result<i64, QueryError> {
        parse_seq(id.as_str())
            .filter(|seq| graph.nodes.contains_key(seq))
            .ok_or_else(|| QueryError::node_not_found(id.as_str()))
    }
}

#[async_trait]
impl QueryService for MemoryGraphService {
    async fn run(&self, query: &GraphQuery) -> Result<QueryResult, QueryError> {
        let records = self.graph.lock().run(query);
        debug!("{} returned {} records", query.describe(), records.len());
        Ok(QueryResult::new(records))
    }

    async fn create_node(&self, label: &str, properties: Properties) -> Result<RawNode, QueryError> {
        if label.trim().is_empty() {
            return Err(QueryError::Rejected("node label must not be empty".into()));
        }
        let mut graph = self.graph.lock();
        let seq = graph.allocate();
        graph.nodes.insert(
            seq,
            StoredNode {
                labels: vec![label.to_string()],
                properties,
            },
        );
        graph
            .raw_node(seq)
            .ok_or_else(|| QueryError::node_not_found(seq.to_string()))
    }

    async fn update_node(&self, id: &NodeId, properties: Properties) -> Result<RawNode, QueryError> {
        let mut graph = self.graph.lock();
        let seq = Self::node_seq(&graph, id)?;
        if let Some(node) = graph.nodes.get_mut(&seq) {
            node.properties.extend(properties);
        }
        graph
            .raw_node(seq)
            .ok_or_else(|| QueryError::node_not_found(id.as_str()))
    }

    async fn delete_node(&self, id: &NodeId) -> Result<(), QueryError> {
        let mut graph = self.graph.lock();
        let seq = Self::node_seq(&graph, id)?;
        graph.nodes.remove(&seq);
        graph.rels.retain(|_, rel| rel.start != seq && rel.end != seq);
        Ok(())
    }

    async fn create_relation(
        &self,
        from: &NodeId,
        to: &NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> Result<RawRelationship, QueryError> {
        if rel_type.trim().is_empty() {
            return Err(QueryError::Rejected("relationship type must not be empty".into()));
        }
        let mut graph = self.graph.lock();
        let start = Self::node_seq(&graph, from)?;
        let end = Self::node_seq(&graph, to)?;
        let seq = graph.allocate();
        graph.rels.insert(
            seq,
            StoredRel {
                rel_type: rel_type.to_string(),
                start,
                end,
                properties,
            },
        );
        graph
            .raw_rel(seq)
            .ok_or_else(|| QueryError::relation_not_found(seq.to_string()))
    }

    async fn delete_relation(&self, id: &EdgeId) -> Result<(), QueryError> {
        let mut graph = self.graph.lock();
        let removed = parse_seq(id.as_str()).and_then(|seq| graph.rels.remove(&seq));
        match removed {
            Some(_) => Ok(()),
            None => Err(QueryError::relation_not_found(id.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "nodes": [
            {"key": "num", "labels": ["Competency"], "properties": {"name": "Number sense"}},
            {"key": "frac", "labels": ["Concept"], "properties": {"name": "Fractions", "status": 1}},
            {"key": "cmp", "labels": ["Skill"], "properties": {"name": "Compare fractions"}},
            {"key": "pizza", "labels": ["Task"], "properties": {"title": "Pizza slices"}},
            {"key": "lonely", "labels": ["Concept"], "properties": {"name": "Topology"}}
        ],
        "relationships": [
            {"from": "cmp", "to": "frac", "type": "REQUIRES"},
            {"from": "frac", "to": "pizza", "type": "TESTED_BY"},
            {"from": "num", "to": "cmp", "type": "INCLUDES"},
            {"from": "ghost", "to": "cmp", "type": "INCLUDES"}
        ]
    }"#;

    fn service() -> MemoryGraphService {
        MemoryGraphService::from_json(FIXTURE).unwrap()
    }

    fn node_ids(result: &QueryResult, field: &str) -> Vec<String> {
        result
            .records
            .iter()
            .filter_map(|r| r.node(field).unwrap())
            .filter_map(|n| n.identity.element_id.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_fixture_loading() {
        let service = service();
        assert_eq!(service.node_count(), 5);
        assert_eq!(service.relation_count(), 3);
    }

    #[tokio::test]
    async fn test_overview_newest_first_with_isolated_nodes() {
        let result = service().run(&GraphQuery::Overview { limit: 1 }).await.unwrap();
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.node("n").unwrap().unwrap().identity.element_id.as_deref(), Some("mem:5"));
        assert!(record.relationship("r").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_neighbors_of_node() {
        let result = service()
            .run(&GraphQuery::Neighbors {
                id: NodeId::from("mem:3"),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(node_ids(&result, "m"), vec!["mem:2", "mem:1"]);

        let unknown = service()
            .run(&GraphQuery::Neighbors {
                id: NodeId::from("mem:99"),
                limit: 10,
            })
            .await
            .unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_related_groups_by_label() {
        let service = service();
        let related = |id: &str, labels: &[&str], limit: usize| GraphQuery::Related {
            id: NodeId::from(id),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            limit,
        };

        let result = service
            .run(&related("mem:3", &["Concept", "Task", "Competency"], 10))
            .await
            .unwrap();
        assert_eq!(node_ids(&result, "m"), vec!["mem:2", "mem:1"]);
        assert_eq!(node_ids(&result, "n"), vec!["mem:3", "mem:3"]);

        let isolated = service.run(&related("mem:5", &["Task"], 10)).await.unwrap();
        assert_eq!(isolated.records.len(), 1);
        assert!(node_ids(&isolated, "m").is_empty());

        let unknown = service.run(&related("mem:99", &["Task"], 10)).await.unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_paths_respect_depth_and_limit() {
        let service = service();
        let one = service
            .run(&GraphQuery::Paths {
                keyword: "FRACTIONS".into(),
                depth: 1,
                limit: 100,
            })
            .await
            .unwrap();
        assert_eq!(one.records.len(), 2);

        let two = service
            .run(&GraphQuery::Paths {
                keyword: "fractions".into(),
                depth: 2,
                limit: 100,
            })
            .await
            .unwrap();
        assert_eq!(two.records.len(), 3);
        let longest = two.records.last().unwrap();
        assert_eq!(longest.nodes("ns").unwrap().len(), 3);
        assert_eq!(longest.relationships("rs").unwrap().len(), 2);

        let capped = service
            .run(&GraphQuery::Paths {
                keyword: "fractions".into(),
                depth: 2,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(capped.records.len(), 1);
    }

    #[tokio::test]
    async fn test_search_and_catalogs() {
        let service = service();
        let found = service
            .run(&GraphQuery::Search {
                keyword: "frac".into(),
                label: Some("Skill".into()),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(node_ids(&found, "n"), vec!["mem:3"]);

        let labels = service.run(&GraphQuery::LabelCatalog { limit: 100 }).await.unwrap();
        let values: Vec<_> = labels
            .records
            .iter()
            .filter_map(|r| r.scalar(CATALOG_FIELD).unwrap().and_then(|v| v.as_text()))
            .collect();
        assert_eq!(values, vec!["Competency", "Concept", "Skill", "Task"]);

        let types = service.run(&GraphQuery::TypeCatalog { limit: 2 }).await.unwrap();
        assert_eq!(types.records.len(), 2);
    }

    #[tokio::test]
    async fn test_edits() {
        let service = service();
        let created = service
            .create_node("Concept", Properties::from([("name".to_string(), "Ratios".into())]))
            .await
            .unwrap();
        let id = NodeId::new(created.identity.element_id.clone().unwrap());

        let updated = service
            .update_node(&id, Properties::from([("name".to_string(), "Ratio".into())]))
            .await
            .unwrap();
        assert_eq!(updated.property("name"), Some(&PropertyValue::from("Ratio")));

        let rel = service
            .create_relation(&id, &NodeId::from("2"), "RELATES_TO", Properties::new())
            .await
            .unwrap();
        assert_eq!(rel.end.element_id.as_deref(), Some("mem:2"));

        service.delete_node(&NodeId::from("mem:2")).await.unwrap();
        assert_eq!(service.relation_count(), 1);
        assert_eq!(
            service.delete_node(&NodeId::from("mem:2")).await,
            Err(QueryError::node_not_found("mem:2"))
        );
        assert!(service.create_node(" ", Properties::new()).await.is_err());
    }
}
