use graphdesk_core::{EdgeId, NodeId};
use graphdesk_events::GraphEvent;

/// What a sink gesture means for the studio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    NodeSelected(NodeId),
    EdgeSelected(EdgeId),
    /// Two distinct nodes were picked for a new relationship; the caller
    /// still has to ask for its type.
    RelationDraft { from: NodeId, to: NodeId },
    Ignored,
}

/// Selection and link-drawing state fed by [`GraphEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub selected_node: Option<NodeId>,
    pub selected_edge: Option<EdgeId>,
    pending_link_from: Option<NodeId>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms link mode: the next distinct node selection completes a draft.
    pub fn begin_link(&mut self, from: NodeId) {
        self.pending_link_from = Some(from);
    }

    pub fn cancel_link(&mut self) {
        self.pending_link_from = None;
    }

    pub fn pending_link_from(&self) -> Option<&NodeId> {
        self.pending_link_from.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected_node = None;
        self.selected_edge = None;
    }

    /// Drops references to a node that left the canvas.
    pub fn forget_node(&mut self, id: &NodeId) {
        if self.selected_node.as_ref() == Some(id) {
            self.selected_node = None;
        }
        if self.pending_link_from.as_ref() == Some(id) {
            self.pending_link_from = None;
        }
    }

    pub fn forget_edge(&mut self, id: &EdgeId) {
        if self.selected_edge.as_ref() == Some(id) {
            self.selected_edge = None;
        }
    }

    pub fn dispatch(&mut self, event: GraphEvent) -> Interaction {
        match event {
            GraphEvent::NodeSelected(id) => {
                self.selected_node = Some(id.clone());
                self.selected_edge = None;
                // Re-picking the source keeps the link armed.
                match self.pending_link_from.take() {
                    Some(from) if from != id => Interaction::RelationDraft { from, to: id },
                    pending => {
                        self.pending_link_from = pending;
                        Interaction::NodeSelected(id)
                    }
                }
            }
            GraphEvent::EdgeSelected(id) => {
                self.selected_edge = Some(id.clone());
                self.selected_node = None;
                Interaction::EdgeSelected(id)
            }
            GraphEvent::EdgeDrawRequested { from, to } => {
                self.pending_link_from = None;
                if from == to {
                    Interaction::Ignored
                } else {
                    Interaction::RelationDraft { from, to }
                }
            }
        }
    }
}
