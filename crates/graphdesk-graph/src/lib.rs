pub mod evidence;
pub mod frame;
pub mod labels;
pub mod layout;
pub mod merge;
pub mod model;
pub mod normalizer;
pub mod projector;
pub mod state;
pub mod style;

pub use evidence::{EvidenceBuilder, EvidenceLink, EvidenceRecord, LinkDirection, render_evidence_text};
pub use frame::{FrameBuilder, RenderFrame, StyleOptions};
pub use labels::{
    Classification, GroupingTable, display_label, group_of, layout_level, property_name,
};
pub use layout::{LayoutMode, LayoutParams, Layouter, RadialLayouter, TieredLayouter, apply_layout};
pub use merge::{MergeOutcome, merge};
pub use model::{FilterState, VisualEdge, VisualGraph, VisualNode};
pub use normalizer::{
    FieldNames, NormalizedBatch, NormalizedNode, NormalizedPath, NormalizedRecord, NormalizedRel,
    Normalizer, RecordShape,
};
pub use projector::GraphProjector;
pub use state::{EditError, GraphState};
pub use style::{Color, StatusHighlight, assign_group_colors, palette_color, status_highlight};
