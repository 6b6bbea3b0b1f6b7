use crate::{CoreError, ElementRef, Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub identity: ElementRef,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl RawNode {
    pub fn new(identity: ElementRef, labels: &[&str]) -> Self {
        Self {
            identity,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key).filter(|v| !v.is_null())
    }
}

/// A directed relationship `start -> end`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRelationship {
    pub identity: ElementRef,
    pub rel_type: String,
    pub start: ElementRef,
    pub end: ElementRef,
    #[serde(default)]
    pub properties: Properties,
}

impl RawRelationship {
    pub fn new(identity: ElementRef, rel_type: &str, start: ElementRef, end: ElementRef) -> Self {
        Self {
            identity,
            rel_type: rel_type.to_string(),
            start,
            end,
            properties: Properties::new(),
        }
    }
}

/// Result of a variable-length traversal: `nodes[i] -[relationships[i]]- nodes[i + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    pub nodes: Vec<RawNode>,
    pub relationships: Vec<RawRelationship>,
}

/// One named field of a query record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum RecordValue {
    #[default]
    Null,
    Node(RawNode),
    Relationship(RawRelationship),
    Nodes(Vec<RawNode>),
    Relationships(Vec<RawRelationship>),
    Scalar(PropertyValue),
}

impl RecordValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Node(_) => "node",
            Self::Relationship(_) => "relationship",
            Self::Nodes(_) => "node list",
            Self::Relationships(_) => "relationship list",
            Self::Scalar(_) => "scalar",
        }
    }
}

/// A query result row; fields are addressed by name, never by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: BTreeMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: RecordValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.fields.get(name)
    }

    fn mismatch(name: &str, expected: &'static str, found: &RecordValue) -> CoreError {
        CoreError::UnexpectedFieldType {
            field: name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    pub fn node(&self, name: &str) -> Result<Option<&RawNode>, CoreError> {
        match self.get(name) {
            None | Some(RecordValue::Null) => Ok(None),
            Some(RecordValue::Node(node)) => Ok(Some(node)),
            Some(other) => Err(Self::mismatch(name, "node", other)),
        }
    }

    pub fn relationship(&self, name: &str) -> Result<Option<&RawRelationship>, CoreError> {
        match self.get(name) {
            None | Some(RecordValue::Null) => Ok(None),
            Some(RecordValue::Relationship(rel)) => Ok(Some(rel)),
            Some(other) => Err(Self::mismatch(name, "relationship", other)),
        }
    }

    /// Node list field; absent or null reads as empty.
    pub fn nodes(&self, name: &str) -> Result<&[RawNode], CoreError> {
        match self.get(name) {
            None | Some(RecordValue::Null) => Ok(&[]),
            Some(RecordValue::Nodes(nodes)) => Ok(nodes),
            Some(other) => Err(Self::mismatch(name, "node list", other)),
        }
    }

    pub fn relationships(&self, name: &str) -> Result<&[RawRelationship], CoreError> {
        match self.get(name) {
            None | Some(RecordValue::Null) => Ok(&[]),
            Some(RecordValue::Relationships(rels)) => Ok(rels),
            Some(other) => Err(Self::mismatch(name, "relationship list", other)),
        }
    }

    pub fn scalar(&self, name: &str) -> Result<Option<&PropertyValue>, CoreError> {
        match self.get(name) {
            None | Some(RecordValue::Null) => Ok(None),
            Some(RecordValue::Scalar(value)) => Ok(Some(value)),
            Some(other) => Err(Self::mismatch(name, "scalar", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub records: Vec<Record>,
}

impl QueryResult {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_field_access() {
        let node = RawNode::new(ElementRef::legacy(1), &["Concept"]).with_property("name", "Area");
        let record = Record::new()
            .with("n", RecordValue::Node(node.clone()))
            .with("r", RecordValue::Null);

        assert_eq!(record.node("n").unwrap(), Some(&node));
        assert_eq!(record.relationship("r").unwrap(), None);
        assert_eq!(record.node("m").unwrap(), None);
        assert!(record.nodes("ns").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_field_kind_is_reported() {
        let record = Record::new().with("n", RecordValue::Scalar(PropertyValue::Int(3)));
        let err = record.node("n").expect_err("scalar is not a node");
        assert_eq!(
            err,
            CoreError::UnexpectedFieldType {
                field: "n".to_string(),
                expected: "node",
                found: "scalar",
            }
        );
    }

    #[test]
    fn test_null_properties_are_hidden() {
        let node = RawNode::new(ElementRef::legacy(1), &[]).with_property("name", PropertyValue::Null);
        assert!(node.property("name").is_none());
    }
}
