use crate::labels::GroupingTable;
use crate::model::VisualGraph;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Positions are left to the sink's physics solver.
    #[default]
    ForceDirected,
    /// Top-down arrangement by the sink, without precomputed tiers.
    Hierarchical,
    /// Top-down arrangement with `level` taken from each node's labels.
    Tiered,
    /// Fixed positions evenly spaced on a circle.
    Radial,
}

impl LayoutMode {
    /// Whether the sink should run its physics solver for this mode.
    pub fn uses_physics(self) -> bool {
        matches!(self, Self::ForceDirected | Self::Hierarchical)
    }

    pub fn is_hierarchical(self) -> bool {
        matches!(self, Self::Hierarchical | Self::Tiered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub min_radius: f64,
    /// Radius contributed by each node in radial mode.
    pub spacing: f64,
    pub level_separation: f64,
    pub node_spacing: f64,
}

impl LayoutParams {
    pub const DEFAULT_MIN_RADIUS: f64 = 300.0;
    pub const DEFAULT_SPACING: f64 = 15.0;
    pub const DEFAULT_LEVEL_SEPARATION: f64 = 140.0;
    pub const DEFAULT_NODE_SPACING: f64 = 90.0;
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            min_radius: Self::DEFAULT_MIN_RADIUS,
            spacing: Self::DEFAULT_SPACING,
            level_separation: Self::DEFAULT_LEVEL_SEPARATION,
            node_spacing: Self::DEFAULT_NODE_SPACING,
        }
    }
}

pub trait Layouter {
    fn execute(&self, graph: &mut VisualGraph);
}

pub struct TieredLayouter<'a> {
    pub grouping: &'a GroupingTable,
}

impl Layouter for TieredLayouter<'_> {
    fn execute(&self, graph: &mut VisualGraph) {
        for node in &mut graph.nodes {
            node.level = Some(self.grouping.layout_level(&node.labels));
            node.x = None;
            node.y = None;
        }
    }
}

pub struct RadialLayouter {
    pub min_radius: f64,
    pub spacing: f64,
}

impl Default for RadialLayouter {
    fn default() -> Self {
        Self {
            min_radius: LayoutParams::DEFAULT_MIN_RADIUS,
            spacing: LayoutParams::DEFAULT_SPACING,
        }
    }
}

impl RadialLayouter {
    pub fn radius(&self, count: usize) -> f64 {
        self.min_radius.max(count as f64 * self.spacing)
    }
}

impl Layouter for RadialLayouter {
    fn execute(&self, graph: &mut VisualGraph) {
        let count = graph.nodes.len();
        let radius = self.radius(count);
        for (i, node) in graph.nodes.iter_mut().enumerate() {
            let angle = TAU * i as f64 / count as f64;
            node.x = Some(radius * angle.cos());
            node.y = Some(radius * angle.sin());
            node.level = None;
        }
    }
}

fn clear_placement(graph: &mut VisualGraph) {
    for node in &mut graph.nodes {
        node.level = None;
        node.x = None;
        node.y = None;
    }
}

/// Sets or clears precomputed levels and positions for `mode`.
pub fn apply_layout(
    graph: &mut VisualGraph,
    mode: LayoutMode,
    params: &LayoutParams,
    grouping: &GroupingTable,
) {
    match mode {
        LayoutMode::Tiered => TieredLayouter { grouping }.execute(graph),
        LayoutMode::Radial => RadialLayouter {
            min_radius: params.min_radius,
            spacing: params.spacing,
        }
        .execute(graph),
        LayoutMode::ForceDirected | LayoutMode::Hierarchical => clear_placement(graph),
    }
}
