use crate::labels::GroupingTable;
use crate::model::{FilterState, VisualEdge, VisualGraph, VisualNode};
use crate::normalizer::{
    NormalizedBatch, NormalizedNode, NormalizedPath, NormalizedRecord, NormalizedRel, RecordShape,
};
use graphdesk_core::{EdgeId, NodeId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Insertion-ordered node/edge collection keyed by id.
#[derive(Default)]
struct Accumulator {
    graph: VisualGraph,
    node_map: HashMap<NodeId, usize>,
    edge_ids: HashSet<EdgeId>,
    placeholders: HashSet<NodeId>,
}

impl Accumulator {
    fn add_node(&mut self, node: VisualNode) {
        if let Some(&idx) = self.node_map.get(&node.id) {
            // A node first seen only as a relationship endpoint takes the real data.
            if self.placeholders.remove(&node.id) {
                self.graph.nodes[idx] = node;
            }
            return;
        }
        self.node_map.insert(node.id.clone(), self.graph.nodes.len());
        self.graph.nodes.push(node);
    }

    fn add_placeholder(&mut self, id: &NodeId, group: &str) {
        if self.node_map.contains_key(id) {
            return;
        }
        self.placeholders.insert(id.clone());
        let mut node = VisualNode::new(id.clone(), id.as_str(), group, Vec::new());
        node.unnamed = true;
        self.add_node(node);
    }

    fn has_node(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    fn add_edge(&mut self, edge: VisualEdge) {
        if !self.has_node(&edge.from) || !self.has_node(&edge.to) {
            debug!("Skipping edge {} with missing endpoint", edge.id);
            return;
        }
        if self.edge_ids.insert(edge.id.clone()) {
            self.graph.edges.push(edge);
        }
    }
}

/// Converts normalized query rows into the deduplicated visual model.
#[derive(Debug, Clone, Default)]
pub struct GraphProjector {
    grouping: GroupingTable,
}

impl GraphProjector {
    pub fn new(grouping: GroupingTable) -> Self {
        Self { grouping }
    }

    pub fn grouping(&self) -> &GroupingTable {
        &self.grouping
    }

    pub fn visual_node(&self, node: &NormalizedNode) -> VisualNode {
        let mut visual = VisualNode::new(
            node.id.clone(),
            node.display_label(),
            self.grouping.group_of(&node.labels),
            node.labels.clone(),
        );
        visual.status = node.status();
        visual.unnamed = node.name().is_none();
        visual
    }

    pub fn visual_edge(rel: &NormalizedRel) -> VisualEdge {
        VisualEdge {
            id: rel.edge_id(),
            from: rel.start.clone(),
            to: rel.end.clone(),
            label: rel.rel_type.clone(),
        }
    }

    /// Record form. A relationship is admitted when its type passes and either
    /// endpoint passes the label filter; both endpoints come with it.
    pub fn project_records(&self, records: &[NormalizedRecord], filter: &FilterState) -> VisualGraph {
        let mut acc = Accumulator::default();

        for record in records {
            let Some(n) = &record.n else {
                continue;
            };
            let n_ok = filter.admits_labels(&n.labels);

            let Some(r) = &record.r else {
                if n_ok {
                    acc.add_node(self.visual_node(n));
                }
                continue;
            };

            let m_ok = record
                .m
                .as_ref()
                .is_some_and(|m| filter.admits_labels(&m.labels));
            let t_ok = filter.admits_type(&r.rel_type);
            if !(t_ok && (!filter.label_filter_active() || n_ok || m_ok)) {
                continue;
            }

            acc.add_node(self.visual_node(n));
            if let Some(m) = &record.m {
                acc.add_node(self.visual_node(m));
            }
            acc.add_placeholder(&r.start, &self.grouping.default_group);
            acc.add_placeholder(&r.end, &self.grouping.default_group);
            acc.add_edge(Self::visual_edge(r));
        }

        acc.graph
    }

    /// Path form. Nodes and relationships are filtered independently; a
    /// relationship whose endpoint was filtered out is pruned.
    pub fn project_paths(&self, paths: &[NormalizedPath], filter: &FilterState) -> VisualGraph {
        let mut acc = Accumulator::default();

        for node in paths.iter().flat_map(|p| p.nodes.iter()) {
            if filter.admits_labels(&node.labels) {
                acc.add_node(self.visual_node(node));
            }
        }
        for rel in paths.iter().flat_map(|p| p.rels.iter()) {
            if filter.admits_type(&rel.rel_type) {
                acc.add_edge(Self::visual_edge(rel));
            }
        }

        acc.graph
    }

    pub fn project_batch(&self, batch: &NormalizedBatch, filter: &FilterState) -> VisualGraph {
        match batch.shape {
            RecordShape::SingleHop => self.project_records(&batch.records, filter),
            RecordShape::PathHop => self.project_paths(&batch.paths, filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdesk_core::{MasteryStatus, Properties, PropertyValue};

    fn node(id: &str, labels: &[&str]) -> NormalizedNode {
        NormalizedNode {
            id: NodeId::from(id),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: Properties::new(),
        }
    }

    fn rel(id: Option<&str>, kind: &str, start: &str, end: &str) -> NormalizedRel {
        NormalizedRel {
            id: id.map(EdgeId::from),
            rel_type: kind.to_string(),
            start: NodeId::from(start),
            end: NodeId::from(end),
            properties: Properties::new(),
        }
    }

    fn hop(n: NormalizedNode, r: Option<NormalizedRel>, m: Option<NormalizedNode>) -> NormalizedRecord {
        NormalizedRecord { n: Some(n), r, m }
    }

    fn ids(graph: &VisualGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_or_admission_pulls_in_neighbor() {
        let records = vec![hop(
            node("A", &["Concept"]),
            Some(rel(Some("e1"), "TESTS", "A", "B")),
            Some(node("B", &["Task"])),
        )];
        let filter = FilterState::new(["Concept"], Vec::<String>::new());
        let graph = GraphProjector::default().project_records(&records, &filter);

        assert_eq!(ids(&graph), vec!["A", "B"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from.as_str(), "A");
        assert_eq!(graph.edges[0].to.as_str(), "B");
    }

    #[test]
    fn test_neither_endpoint_matching_excludes_edge() {
        let records = vec![hop(
            node("A", &["Task"]),
            Some(rel(Some("e1"), "TESTS", "A", "B")),
            Some(node("B", &["Task"])),
        )];
        let filter = FilterState::new(["Concept"], ["TESTS"]);
        let graph = GraphProjector::default().project_records(&records, &filter);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_type_filter_rejects_relationship() {
        let records = vec![hop(
            node("A", &["Concept"]),
            Some(rel(Some("e1"), "REQUIRES", "A", "B")),
            Some(node("B", &["Concept"])),
        )];
        let filter = FilterState::new(Vec::<String>::new(), ["TESTS"]);
        let graph = GraphProjector::default().project_records(&records, &filter);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_isolated_node_respects_label_filter() {
        let records = vec![
            hop(node("A", &["Concept"]), None, None),
            hop(node("B", &["Task"]), None, None),
            NormalizedRecord::default(),
        ];
        let filter = FilterState::new(["Concept"], Vec::<String>::new());
        let graph = GraphProjector::default().project_records(&records, &filter);
        assert_eq!(ids(&graph), vec!["A"]);
    }

    #[test]
    fn test_endpoint_outside_row_becomes_placeholder() {
        let records = vec![hop(
            node("A", &["Concept"]),
            Some(rel(Some("e1"), "PART_OF", "A", "Z")),
            None,
        )];
        let graph = GraphProjector::default().project_records(&records, &FilterState::default());
        assert_eq!(ids(&graph), vec!["A", "Z"]);
        let z = graph.node(&NodeId::from("Z")).unwrap();
        assert_eq!(z.label, "Z");
        assert_eq!(z.group, "Node");
        assert!(z.labels.is_empty());
        assert!(z.unnamed);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_placeholder_upgraded_by_later_sighting() {
        let records = vec![
            hop(node("A", &["Concept"]), Some(rel(Some("e1"), "PART_OF", "A", "Z")), None),
            hop(node("Z", &["Skill"]), None, None),
        ];
        let graph = GraphProjector::default().project_records(&records, &FilterState::default());
        assert_eq!(ids(&graph), vec!["A", "Z"]);
        assert_eq!(graph.node(&NodeId::from("Z")).unwrap().group, "Skill");
    }

    #[test]
    fn test_path_flattening() {
        let path = NormalizedPath {
            nodes: vec![node("1", &["Concept"]), node("2", &["Concept"]), node("3", &["Skill"])],
            rels: vec![rel(Some("r1"), "NEXT", "1", "2"), rel(Some("r2"), "NEXT", "2", "3")],
        };
        let graph = GraphProjector::default().project_paths(&[path], &FilterState::default());

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!((graph.edges[0].from.as_str(), graph.edges[0].to.as_str()), ("1", "2"));
        assert_eq!((graph.edges[1].from.as_str(), graph.edges[1].to.as_str()), ("2", "3"));
    }

    #[test]
    fn test_path_filter_prunes_dangling_edges() {
        let path = NormalizedPath {
            nodes: vec![node("1", &["Concept"]), node("2", &["Task"]), node("3", &["Concept"])],
            rels: vec![rel(Some("r1"), "NEXT", "1", "2"), rel(Some("r2"), "NEXT", "2", "3")],
        };
        let filter = FilterState::new(["Concept"], Vec::<String>::new());
        let graph = GraphProjector::default().project_paths(&[path], &filter);
        assert_eq!(ids(&graph), vec!["1", "3"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_paths_dedup_across_batch() {
        let p1 = NormalizedPath {
            nodes: vec![node("1", &[]), node("2", &[])],
            rels: vec![rel(None, "NEXT", "1", "2")],
        };
        let p2 = p1.clone();
        let graph = GraphProjector::default().project_paths(&[p1, p2], &FilterState::default());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges[0].id.as_str(), "1-2-NEXT");
    }

    #[test]
    fn test_status_and_group_projected() {
        let mut concept = node("A", &["Concept", "Stage"]);
        concept
            .properties
            .insert("status".to_string(), PropertyValue::Int(1));
        concept
            .properties
            .insert("name".to_string(), PropertyValue::from("Fractions"));
        let graph = GraphProjector::default()
            .project_records(&[hop(concept, None, None)], &FilterState::default());
        let a = &graph.nodes[0];
        assert_eq!(a.label, "Fractions");
        assert_eq!(a.group, "Concept");
        assert_eq!(a.status, Some(MasteryStatus::InProgress));
        assert!(!a.unnamed);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        const LABELS: [&str; 4] = ["Concept", "Skill", "Task", "Grade"];

        fn arb_node() -> impl Strategy<Value = NormalizedNode> {
            (0u8..8, proptest::sample::subsequence(LABELS.to_vec(), 0..3))
                .prop_map(|(id, labels)| node(&id.to_string(), &labels))
        }

        fn arb_record() -> impl Strategy<Value = NormalizedRecord> {
            (arb_node(), proptest::option::of((arb_node(), 0u8..3, any::<bool>()))).prop_map(
                |(n, hop_to)| match hop_to {
                    None => NormalizedRecord { n: Some(n), r: None, m: None },
                    Some((m, kind, with_id)) => {
                        let kind = ["TESTS", "REQUIRES", "PART_OF"][kind as usize];
                        let edge_id = format!("{}>{}", n.id, m.id);
                        let r = rel(
                            with_id.then_some(edge_id.as_str()),
                            kind,
                            n.id.as_str(),
                            m.id.as_str(),
                        );
                        NormalizedRecord { n: Some(n), r: Some(r), m: Some(m) }
                    }
                },
            )
        }

        fn arb_filter() -> impl Strategy<Value = FilterState> {
            (
                proptest::sample::subsequence(LABELS.to_vec(), 0..2),
                proptest::sample::subsequence(vec!["TESTS", "REQUIRES"], 0..2),
            )
                .prop_map(|(labels, types)| FilterState::new(labels, types))
        }

        proptest! {
            #[test]
            fn test_projection_is_deterministic(
                records in proptest::collection::vec(arb_record(), 0..20),
                filter in arb_filter(),
            ) {
                let projector = GraphProjector::default();
                prop_assert_eq!(
                    projector.project_records(&records, &filter),
                    projector.project_records(&records, &filter)
                );
            }

            #[test]
            fn test_projection_dedup_idempotent(
                records in proptest::collection::vec(arb_record(), 0..20),
                filter in arb_filter(),
            ) {
                let projector = GraphProjector::default();
                let once = projector.project_records(&records, &filter);
                let doubled: Vec<_> = records.iter().chain(records.iter()).cloned().collect();
                let twice = projector.project_records(&doubled, &filter);
                prop_assert_eq!(once.node_count(), twice.node_count());
                prop_assert_eq!(once.edge_count(), twice.edge_count());
            }

            #[test]
            fn test_edges_never_dangle(
                records in proptest::collection::vec(arb_record(), 0..20),
                filter in arb_filter(),
            ) {
                let graph = GraphProjector::default().project_records(&records, &filter);
                for edge in &graph.edges {
                    prop_assert!(graph.contains_node(&edge.from));
                    prop_assert!(graph.contains_node(&edge.to));
                }
                let unique: HashSet<_> = graph.nodes.iter().map(|n| n.id.clone()).collect();
                prop_assert_eq!(unique.len(), graph.node_count());
            }
        }
    }
}
