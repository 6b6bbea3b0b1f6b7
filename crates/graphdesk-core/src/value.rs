use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type Properties = BTreeMap<String, PropertyValue>;

/// A property value as stored on a node or relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Display text for the value, `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let props: Properties =
            serde_json::from_str(r#"{"name":"Fractions","status":2,"weight":0.5,"tags":["a",1],"x":null}"#)
                .unwrap();
        assert_eq!(props["name"], PropertyValue::from("Fractions"));
        assert_eq!(props["status"], PropertyValue::Int(2));
        assert_eq!(props["weight"], PropertyValue::Float(0.5));
        assert!(props["x"].is_null());
        assert_eq!(props["tags"].to_string(), "a,1");
    }

    #[test]
    fn test_as_text_and_as_i64() {
        assert_eq!(PropertyValue::Null.as_text(), None);
        assert_eq!(PropertyValue::Int(7).as_text().as_deref(), Some("7"));
        assert_eq!(PropertyValue::from(" 2 ").as_i64(), Some(2));
        assert_eq!(PropertyValue::Float(1.0).as_i64(), Some(1));
        assert_eq!(PropertyValue::Float(1.5).as_i64(), None);
        assert_eq!(PropertyValue::Bool(true).as_i64(), None);
    }
}
