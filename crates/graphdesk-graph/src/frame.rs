use crate::labels::GroupingTable;
use crate::layout::{LayoutMode, LayoutParams, apply_layout};
use crate::model::{VisualEdge, VisualGraph, VisualNode};
use crate::style::{Color, StatusHighlight, assign_group_colors, status_highlight};
use graphdesk_core::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub group_colors: BTreeMap<String, Color>,
    pub layout: LayoutMode,
    pub physics: bool,
    /// Top-down hierarchical arrangement in the sink.
    pub hierarchical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_separation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_spacing: Option<f64>,
}

/// Everything the rendering sink needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    pub options: StyleOptions,
    pub highlights: BTreeMap<NodeId, StatusHighlight>,
}

impl RenderFrame {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

pub struct FrameBuilder<'a> {
    grouping: &'a GroupingTable,
    mode: LayoutMode,
    params: LayoutParams,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(grouping: &'a GroupingTable) -> Self {
        Self {
            grouping,
            mode: LayoutMode::default(),
            params: LayoutParams::default(),
        }
    }

    pub fn layout(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn params(mut self, params: LayoutParams) -> Self {
        self.params = params;
        self
    }

    /// Styles a copy of `graph`; the source state is never touched.
    pub fn build(&self, graph: &VisualGraph) -> RenderFrame {
        let mut graph = graph.clone();
        apply_layout(&mut graph, self.mode, &self.params, self.grouping);

        let highlights = graph
            .nodes
            .iter()
            .filter_map(|n| status_highlight(n.status).map(|h| (n.id.clone(), h)))
            .collect();
        let tiered = self.mode == LayoutMode::Tiered;
        let options = StyleOptions {
            group_colors: assign_group_colors(&graph.nodes),
            layout: self.mode,
            physics: self.mode.uses_physics(),
            hierarchical: self.mode.is_hierarchical(),
            level_separation: tiered.then_some(self.params.level_separation),
            node_spacing: tiered.then_some(self.params.node_spacing),
        };

        RenderFrame {
            nodes: graph.nodes,
            edges: graph.edges,
            options,
            highlights,
        }
    }
}
