//! Label-derived identity helpers: display text, semantic group and layout tier.
//!
//! Grouping and tiering share one classifier so the colour a node gets and the
//! tier it is drawn on can never disagree.

use graphdesk_core::Properties;
use serde::{Deserialize, Serialize};

/// Properties consulted, in order, for a node's display text.
pub const LABEL_PROPERTIES: [&str; 3] = ["name", "title", "id"];

pub const DEFAULT_SPECIAL_GROUPS: [&str; 3] = ["Competency", "Skill", "Concept"];

pub const DEFAULT_STAGE_SYNONYMS: [&str; 11] = [
    "Stage",
    "Grade",
    "Level",
    "SchoolStage",
    "学段",
    "小学",
    "初中",
    "高中",
    "大学",
    "学前",
    "幼儿园",
];

pub const STAGE_GROUP: &str = "Stage";
pub const DEFAULT_GROUP: &str = "Node";
pub const DEFAULT_FALLBACK_LEVEL: i32 = 2;

/// Ordered classification table.
///
/// `special` is checked first-match in order, then the stage synonyms, then
/// the node's first raw label, then `default_group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingTable {
    pub special: Vec<String>,
    pub stage_synonyms: Vec<String>,
    pub default_group: String,
    pub fallback_level: i32,
}

impl Default for GroupingTable {
    fn default() -> Self {
        Self {
            special: DEFAULT_SPECIAL_GROUPS.iter().map(|s| s.to_string()).collect(),
            stage_synonyms: DEFAULT_STAGE_SYNONYMS.iter().map(|s| s.to_string()).collect(),
            default_group: DEFAULT_GROUP.to_string(),
            fallback_level: DEFAULT_FALLBACK_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Index into [`GroupingTable::special`].
    Special(usize),
    Stage,
    Raw(String),
    Default,
}

impl GroupingTable {
    pub fn is_stage(&self, labels: &[String]) -> bool {
        labels.iter().any(|l| self.stage_synonyms.contains(l))
    }

    pub fn classify(&self, labels: &[String]) -> Classification {
        if let Some(idx) = self
            .special
            .iter()
            .position(|special| labels.contains(special))
        {
            return Classification::Special(idx);
        }
        if self.is_stage(labels) {
            return Classification::Stage;
        }
        match labels.first() {
            Some(first) => Classification::Raw(first.clone()),
            None => Classification::Default,
        }
    }

    pub fn group_of(&self, labels: &[String]) -> String {
        match self.classify(labels) {
            Classification::Special(idx) => self.special[idx].clone(),
            Classification::Stage => STAGE_GROUP.to_string(),
            Classification::Raw(label) => label,
            Classification::Default => self.default_group.clone(),
        }
    }

    /// Tier for top-down layouts; lower is higher on screen.
    pub fn layout_level(&self, labels: &[String]) -> i32 {
        match self.classify(labels) {
            Classification::Special(idx) => idx as i32 + 1,
            Classification::Stage => self.special.len() as i32 + 1,
            Classification::Raw(_) | Classification::Default => self.fallback_level,
        }
    }
}

pub fn group_of(labels: &[String]) -> String {
    GroupingTable::default().group_of(labels)
}

pub fn layout_level(labels: &[String]) -> i32 {
    GroupingTable::default().layout_level(labels)
}

/// First non-empty `name`, `title` or `id` property.
pub fn property_name(properties: &Properties) -> Option<String> {
    LABEL_PROPERTIES.iter().find_map(|key| {
        properties
            .get(*key)
            .and_then(|value| value.as_text())
            .filter(|text| !text.is_empty())
    })
}

/// Display text: `name`, `title` or `id` property, else the labels joined by
/// newlines, else the node's own identifier.
pub fn display_label(id: &str, labels: &[String], properties: &Properties) -> String {
    if let Some(name) = property_name(properties) {
        return name;
    }

    let joined = labels.join("\n");
    if !joined.is_empty() {
        return joined;
    }
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdesk_core::PropertyValue;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_special_priority_order() {
        assert_eq!(group_of(&labels(&["Stage", "Concept", "Competency"])), "Competency");
        assert_eq!(group_of(&labels(&["Concept", "Skill"])), "Skill");
        assert_eq!(group_of(&labels(&["Concept", "Grade"])), "Concept");
    }

    #[test]
    fn test_stage_synonyms_and_fallbacks() {
        assert_eq!(group_of(&labels(&["初中"])), "Stage");
        assert_eq!(group_of(&labels(&["Task", "Grade"])), "Stage");
        assert_eq!(group_of(&labels(&["Task", "Person"])), "Task");
        assert_eq!(group_of(&[]), "Node");
    }

    #[test]
    fn test_levels_follow_classification() {
        assert_eq!(layout_level(&labels(&["Competency"])), 1);
        assert_eq!(layout_level(&labels(&["Skill"])), 2);
        assert_eq!(layout_level(&labels(&["Concept"])), 3);
        assert_eq!(layout_level(&labels(&["Level"])), 4);
        assert_eq!(layout_level(&labels(&["Task"])), 2);
        assert_eq!(layout_level(&[]), 2);
    }

    #[test]
    fn test_custom_table() {
        let table = GroupingTable {
            special: labels(&["Person", "Event"]),
            stage_synonyms: labels(&["Era"]),
            default_group: "Thing".to_string(),
            fallback_level: 9,
        };
        assert_eq!(table.group_of(&labels(&["Event", "Person"])), "Person");
        assert_eq!(table.layout_level(&labels(&["Event"])), 2);
        assert_eq!(table.layout_level(&labels(&["Era"])), 3);
        assert_eq!(table.group_of(&[]), "Thing");
        assert_eq!(table.layout_level(&labels(&["Concept"])), 9);
    }

    #[test]
    fn test_display_label_priority() {
        let mut props = Properties::new();
        props.insert("id".to_string(), PropertyValue::from("C-12"));
        props.insert("title".to_string(), PropertyValue::from("Ratios"));
        assert_eq!(display_label("x", &labels(&["Concept"]), &props), "Ratios");

        props.insert("name".to_string(), PropertyValue::from(""));
        assert_eq!(display_label("x", &labels(&["Concept"]), &props), "Ratios");

        let empty = Properties::new();
        assert_eq!(display_label("x", &labels(&["Concept", "Skill"]), &empty), "Concept\nSkill");
        assert_eq!(display_label("x", &[], &empty), "x");
    }

    #[test]
    fn test_numeric_id_property_is_used() {
        let mut props = Properties::new();
        props.insert("id".to_string(), PropertyValue::Int(404));
        assert_eq!(display_label("mem:1", &[], &props), "404");
        assert_eq!(property_name(&props).as_deref(), Some("404"));
        assert_eq!(property_name(&Properties::new()), None);
    }
}
