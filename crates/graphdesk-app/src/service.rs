use crate::error::QueryError;
use async_trait::async_trait;
use graphdesk_core::{EdgeId, NodeId, Properties, QueryResult, RawNode, RawRelationship};
use graphdesk_graph::RecordShape;
use serde::{Deserialize, Serialize};

/// Field holding the single scalar of a catalog row.
pub const CATALOG_FIELD: &str = "value";

/// The query forms the studio issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GraphQuery {
    /// Up to `limit` nodes, newest first, each with its one-hop neighbours.
    Overview { limit: usize },
    /// One-hop neighbourhood of a node, for expand.
    Neighbors { id: NodeId, limit: usize },
    /// Traversals of 1..=depth hops from the first node matching `keyword`.
    Paths {
        keyword: String,
        depth: u32,
        limit: usize,
    },
    /// Nodes whose name, title or id contains `keyword`, optionally restricted
    /// to one label. Rows carry only `n`.
    Search {
        keyword: String,
        label: Option<String>,
        limit: usize,
    },
    /// Nodes linked to `id` in either direction that carry one of `labels`,
    /// at most `limit` per label. Rows carry the anchor as `n` and the linked
    /// node as `m`; an anchor without matches yields one row with `n` only.
    Related {
        id: NodeId,
        labels: Vec<String>,
        limit: usize,
    },
    LabelCatalog { limit: usize },
    TypeCatalog { limit: usize },
}

impl GraphQuery {
    pub fn shape(&self) -> RecordShape {
        match self {
            Self::Paths { .. } => RecordShape::PathHop,
            _ => RecordShape::SingleHop,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Overview { limit } => format!("overview (limit {limit})"),
            Self::Neighbors { id, .. } => format!("neighbours of {id}"),
            Self::Paths { keyword, depth, .. } => format!("paths from '{keyword}' (depth {depth})"),
            Self::Search { keyword, .. } => format!("search '{keyword}'"),
            Self::Related { id, labels, .. } => format!("{} linked to {id}", labels.join("/")),
            Self::LabelCatalog { .. } => "label catalog".to_string(),
            Self::TypeCatalog { .. } => "relationship type catalog".to_string(),
        }
    }
}

/// The graph database as the studio sees it.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn run(&self, query: &GraphQuery) -> Result<QueryResult, QueryError>;

    async fn create_node(&self, label: &str, properties: Properties) -> Result<RawNode, QueryError>;

    /// Merges `properties` into the node's existing properties.
    async fn update_node(&self, id: &NodeId, properties: Properties) -> Result<RawNode, QueryError>;

    /// Deletes the node and every relationship touching it.
    async fn delete_node(&self, id: &NodeId) -> Result<(), QueryError>;

    async fn create_relation(
        &self,
        from: &NodeId,
        to: &NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> Result<RawRelationship, QueryError>;

    async fn delete_relation(&self, id: &EdgeId) -> Result<(), QueryError>;
}
