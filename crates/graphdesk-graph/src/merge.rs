use crate::model::VisualGraph;
use crate::state::GraphState;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The incoming subgraph was empty; nothing more to expand.
    NoFurtherNeighbors,
    Extended {
        added_nodes: usize,
        added_edges: usize,
    },
}

/// Folds a freshly projected subgraph into `state`.
///
/// Ids already on screen keep their current data, so status and position
/// edits survive a re-fetch. An empty `incoming` leaves `state` untouched.
pub fn merge(state: GraphState, incoming: VisualGraph) -> (GraphState, MergeOutcome) {
    if incoming.is_empty() {
        return (state, MergeOutcome::NoFurtherNeighbors);
    }

    let mut node_ids: HashSet<_> = state.graph().nodes.iter().map(|n| n.id.clone()).collect();
    let mut edge_ids: HashSet<_> = state.graph().edges.iter().map(|e| e.id.clone()).collect();

    let nodes: Vec<_> = incoming
        .nodes
        .into_iter()
        .filter(|n| node_ids.insert(n.id.clone()))
        .collect();
    let edges: Vec<_> = incoming
        .edges
        .into_iter()
        .filter(|e| node_ids.contains(&e.from) && node_ids.contains(&e.to))
        .filter(|e| edge_ids.insert(e.id.clone()))
        .collect();

    let outcome = MergeOutcome::Extended {
        added_nodes: nodes.len(),
        added_edges: edges.len(),
    };
    if nodes.is_empty() && edges.is_empty() {
        return (state, outcome);
    }
    (state.extended(nodes, edges), outcome)
}
