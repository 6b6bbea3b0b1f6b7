use graphdesk_core::{
    ElementRef, NodeId, QueryResult, RawNode, RawPath, RawRelationship, Record, RecordValue,
};
use graphdesk_graph::{VisualEdge, VisualGraph, VisualNode};

const LABELS: [&str; 5] = ["Competency", "Skill", "Concept", "Task", "Stage"];

fn element(seq: usize) -> ElementRef {
    ElementRef::both(format!("4:bench:{seq}"), seq as i64)
}

fn node(seq: usize) -> RawNode {
    RawNode::new(element(seq), &[LABELS[seq % LABELS.len()]])
        .with_property("name", format!("Node {seq}"))
}

fn relationship(seq: usize, start: usize, end: usize) -> RawRelationship {
    RawRelationship::new(element(seq), "RELATED_TO", element(start), element(end))
}

/// Single-hop rows over `node_count` nodes, each linked to its next
/// `fanout` neighbours. Every relationship shows up twice, once from each end,
/// the way a neighbourhood query returns them.
pub fn synthetic_records(node_count: usize, fanout: usize) -> QueryResult {
    let rel_base = node_count;
    let mut records = Vec::with_capacity(node_count * fanout * 2);
    for i in 0..node_count {
        for k in 1..=fanout {
            let j = (i + k) % node_count;
            let rel = relationship(rel_base + i * fanout + k, i, j);
            for (n, m) in [(i, j), (j, i)] {
                records.push(
                    Record::new()
                        .with("n", RecordValue::Node(node(n)))
                        .with("r", RecordValue::Relationship(rel.clone()))
                        .with("m", RecordValue::Node(node(m))),
                );
            }
        }
    }
    QueryResult::new(records)
}

/// `path_count` overlapping chains of `length` hops.
pub fn synthetic_paths(path_count: usize, length: usize) -> QueryResult {
    let records = (0..path_count)
        .map(|p| {
            let path = RawPath {
                nodes: (p..=p + length).map(node).collect(),
                relationships: (p..p + length)
                    .map(|i| relationship(100_000 + i, i, i + 1))
                    .collect(),
            };
            Record::new()
                .with("ns", RecordValue::Nodes(path.nodes))
                .with("rs", RecordValue::Relationships(path.relationships))
        })
        .collect();
    QueryResult::new(records)
}

/// A ring of `node_count` visual nodes.
pub fn synthetic_graph(node_count: usize) -> VisualGraph {
    let id = |i: usize| NodeId::new(format!("n{}", i % node_count));
    let nodes = (0..node_count)
        .map(|i| {
            let label = LABELS[i % LABELS.len()];
            VisualNode::new(id(i), format!("Node {i}"), label, vec![label.to_string()])
        })
        .collect();
    let edges = (0..node_count)
        .map(|i| VisualEdge {
            id: VisualEdge::synthesized_id(&id(i), &id(i + 1), "NEXT"),
            from: id(i),
            to: id(i + 1),
            label: "NEXT".to_string(),
        })
        .collect();
    VisualGraph { nodes, edges }
}
