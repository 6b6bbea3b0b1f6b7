use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod record;
pub mod status;
pub mod value;

pub use record::{QueryResult, RawNode, RawPath, RawRelationship, Record, RecordValue};
pub use status::MasteryStatus;
pub use value::{Properties, PropertyValue};

/// Stable string identity of a visual node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stable string identity of a visual edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier pair reported by the graph database for an entity.
///
/// `element_id` is the database-native stable identifier; `identity` is the
/// legacy numeric id that older servers still hand out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub identity: Option<i64>,
}

impl ElementRef {
    pub fn element(id: impl Into<String>) -> Self {
        Self {
            element_id: Some(id.into()),
            identity: None,
        }
    }

    pub fn legacy(identity: i64) -> Self {
        Self {
            element_id: None,
            identity: Some(identity),
        }
    }

    pub fn both(id: impl Into<String>, identity: i64) -> Self {
        Self {
            element_id: Some(id.into()),
            identity: Some(identity),
        }
    }

    pub fn is_empty(&self) -> bool {
        resolve_id(self, IdStrategy::PreferElementId).is_none()
    }
}

/// Order in which the identifiers of an [`ElementRef`] are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `element_id`, then the stringified legacy identity.
    #[default]
    PreferElementId,
    /// Stringified legacy identity, then `element_id`.
    PreferLegacy,
}

/// Resolve an entity's identifiers into the single string used for
/// deduplication everywhere downstream.
///
/// Blank element ids are treated as absent. Returns `None` when neither
/// identifier is usable; callers treat that entity as malformed.
pub fn resolve_id(entity: &ElementRef, strategy: IdStrategy) -> Option<String> {
    let element = entity
        .element_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let legacy = entity.identity.map(|id| id.to_string());

    match strategy {
        IdStrategy::PreferElementId => element.or(legacy),
        IdStrategy::PreferLegacy => legacy.or(element),
    }
}

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionError {
    #[error("Invalid MasteryStatus value: {0}")]
    InvalidMasteryStatus(i64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Field `{field}` holds a {found}, expected a {expected}")]
    UnexpectedFieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Entity has no resolvable identifier")]
    UnresolvableId,
    #[error("Invalid enum value: {0}")]
    EnumConversion(#[from] EnumConversionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_element_id() {
        let entity = ElementRef::both("4:abc:17", 17);
        assert_eq!(
            resolve_id(&entity, IdStrategy::PreferElementId).as_deref(),
            Some("4:abc:17")
        );
        assert_eq!(
            resolve_id(&entity, IdStrategy::PreferLegacy).as_deref(),
            Some("17")
        );
    }

    #[test]
    fn test_resolve_falls_back_to_legacy() {
        let entity = ElementRef::legacy(42);
        assert_eq!(
            resolve_id(&entity, IdStrategy::PreferElementId).as_deref(),
            Some("42")
        );

        let blank = ElementRef::both("   ", 7);
        assert_eq!(
            resolve_id(&blank, IdStrategy::PreferElementId).as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_resolve_unusable_identifiers() {
        assert_eq!(resolve_id(&ElementRef::default(), IdStrategy::PreferElementId), None);
        assert_eq!(resolve_id(&ElementRef::element(""), IdStrategy::PreferLegacy), None);
        assert!(ElementRef::default().is_empty());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = NodeId::from("mem:3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mem:3\"");
        assert_eq!(id.to_string(), "mem:3");
    }
}
