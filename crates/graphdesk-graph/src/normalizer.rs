use crate::labels::{display_label, property_name};
use crate::model::VisualEdge;
use graphdesk_core::{
    CoreError, EdgeId, IdStrategy, MasteryStatus, NodeId, Properties, QueryResult, RawNode,
    RawPath, RawRelationship, Record, resolve_id,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which query form produced a result. Supplied by the caller, never sniffed
/// from the record contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    /// `(n, r?, m?)` rows from a node-with-optional-neighbour query.
    SingleHop,
    /// `(ns, rs)` rows from a variable-length traversal.
    PathHop,
}

/// Record field names the normalizer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub node: String,
    pub relationship: String,
    pub other: String,
    pub path_nodes: String,
    pub path_relationships: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            node: "n".to_string(),
            relationship: "r".to_string(),
            other: "m".to_string(),
            path_nodes: "ns".to_string(),
            path_relationships: "rs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNode {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl NormalizedNode {
    pub fn display_label(&self) -> String {
        display_label(self.id.as_str(), &self.labels, &self.properties)
    }

    pub fn name(&self) -> Option<String> {
        property_name(&self.properties)
    }

    pub fn status(&self) -> Option<MasteryStatus> {
        self.properties
            .get(MasteryStatus::PROPERTY)
            .and_then(|value| value.as_i64())
            .and_then(|value| MasteryStatus::try_from(value).ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRel {
    /// `None` when the relationship carried no usable identifier.
    pub id: Option<EdgeId>,
    pub rel_type: String,
    pub start: NodeId,
    pub end: NodeId,
    pub properties: Properties,
}

impl NormalizedRel {
    pub fn edge_id(&self) -> EdgeId {
        match &self.id {
            Some(id) => id.clone(),
            None => VisualEdge::synthesized_id(&self.start, &self.end, &self.rel_type),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub n: Option<NormalizedNode>,
    pub r: Option<NormalizedRel>,
    pub m: Option<NormalizedNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPath {
    pub nodes: Vec<NormalizedNode>,
    pub rels: Vec<NormalizedRel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub shape: RecordShape,
    pub records: Vec<NormalizedRecord>,
    pub paths: Vec<NormalizedPath>,
    /// Rows dropped because a field had the wrong kind or the subject node
    /// had no usable identifier.
    pub skipped: usize,
}

impl NormalizedBatch {
    pub fn empty(shape: RecordShape) -> Self {
        Self {
            shape,
            records: Vec::new(),
            paths: Vec::new(),
            skipped: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.paths.is_empty()
    }
}

/// Turns raw query rows into plain descriptors keyed by resolved string ids.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    strategy: IdStrategy,
    fields: FieldNames,
}

impl Normalizer {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            fields: FieldNames::default(),
        }
    }

    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    pub fn node(&self, node: &RawNode) -> Option<NormalizedNode> {
        let id = resolve_id(&node.identity, self.strategy)?;
        Some(NormalizedNode {
            id: NodeId(id),
            labels: node.labels.clone(),
            properties: node.properties.clone(),
        })
    }

    /// `None` when either endpoint is unresolvable.
    pub fn relationship(&self, rel: &RawRelationship) -> Option<NormalizedRel> {
        let start = resolve_id(&rel.start, self.strategy)?;
        let end = resolve_id(&rel.end, self.strategy)?;
        Some(NormalizedRel {
            id: resolve_id(&rel.identity, self.strategy).map(EdgeId),
            rel_type: rel.rel_type.clone(),
            start: NodeId(start),
            end: NodeId(end),
            properties: rel.properties.clone(),
        })
    }

    pub fn normalize_record(&self, record: &Record) -> Result<NormalizedRecord, CoreError> {
        let n = match record.node(&self.fields.node)? {
            Some(raw) => Some(self.node(raw).ok_or(CoreError::UnresolvableId)?),
            None => None,
        };

        let r = record.relationship(&self.fields.relationship)?.and_then(|raw| {
            let rel = self.relationship(raw);
            if rel.is_none() {
                debug!("Dropping relationship of type {} with unresolvable endpoints", raw.rel_type);
            }
            rel
        });

        let m = record.node(&self.fields.other)?.and_then(|raw| {
            let node = self.node(raw);
            if node.is_none() {
                debug!("Dropping neighbour node without a usable identifier");
            }
            node
        });

        Ok(NormalizedRecord { n, r, m })
    }

    pub fn normalize_path(&self, record: &Record) -> Result<NormalizedPath, CoreError> {
        let nodes = record.nodes(&self.fields.path_nodes)?;
        let rels = record.relationships(&self.fields.path_relationships)?;
        Ok(self.flatten(nodes, rels))
    }

    pub fn normalize_raw_path(&self, path: &RawPath) -> NormalizedPath {
        self.flatten(&path.nodes, &path.relationships)
    }

    fn flatten(&self, nodes: &[RawNode], rels: &[RawRelationship]) -> NormalizedPath {
        let nodes: Vec<NormalizedNode> = nodes.iter().filter_map(|n| self.node(n)).collect();
        let rels: Vec<NormalizedRel> = rels.iter().filter_map(|r| self.relationship(r)).collect();
        NormalizedPath { nodes, rels }
    }

    pub fn normalize_batch(&self, shape: RecordShape, result: &QueryResult) -> NormalizedBatch {
        let mut batch = NormalizedBatch::empty(shape);
        for (index, record) in result.records.iter().enumerate() {
            let outcome = match shape {
                RecordShape::SingleHop => self
                    .normalize_record(record)
                    .map(|normalized| batch.records.push(normalized)),
                RecordShape::PathHop => self
                    .normalize_path(record)
                    .map(|normalized| batch.paths.push(normalized)),
            };
            if let Err(err) = outcome {
                debug!("Skipping malformed record {}: {}", index, err);
                batch.skipped += 1;
            }
        }
        batch
    }
}
