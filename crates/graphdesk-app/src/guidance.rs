//! Study guidance read off the nodes linked to a skill or a competency.

use graphdesk_core::NodeId;
use graphdesk_graph::NormalizedNode;
use serde::{Deserialize, Serialize};

pub const CONCEPT_LABEL: &str = "Concept";
pub const TASK_LABEL: &str = "Task";
pub const INDICATOR_LABEL: &str = "Indicator";
pub const BEHAVIOR_LABEL: &str = "Behavior";

const NOTHING_YET: &str = "No suggestions yet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedNode {
    pub id: NodeId,
    /// `name`, `title` or `id` property; the node id when none is set.
    pub name: String,
}

impl From<&NormalizedNode> for LinkedNode {
    fn from(node: &NormalizedNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name().unwrap_or_else(|| node.id.to_string()),
        }
    }
}

fn section(lines: &mut Vec<String>, heading: &str, nodes: &[LinkedNode]) {
    if nodes.is_empty() {
        return;
    }
    let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    lines.push(format!("{heading}: {}", names.join(", ")));
}

/// What to learn before practising a skill, and what to practise on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillPlan {
    pub skill: NodeId,
    /// Linked concepts, treated as prerequisites.
    pub concepts: Vec<LinkedNode>,
    pub tasks: Vec<LinkedNode>,
}

impl SkillPlan {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.tasks.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        section(&mut lines, "Learn first", &self.concepts);
        section(&mut lines, "Practice tasks", &self.tasks);
        if lines.is_empty() {
            return NOTHING_YET.to_string();
        }
        lines.join("\n")
    }
}

/// How a competency shows up: observable indicators and suggested behaviours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyGuide {
    pub competency: NodeId,
    pub indicators: Vec<LinkedNode>,
    pub behaviors: Vec<LinkedNode>,
}

impl CompetencyGuide {
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty() && self.behaviors.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        section(&mut lines, "Indicators", &self.indicators);
        section(&mut lines, "Suggested behaviours", &self.behaviors);
        if lines.is_empty() {
            return NOTHING_YET.to_string();
        }
        lines.join("\n")
    }
}
