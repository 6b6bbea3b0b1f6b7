use graphdesk_core::CoreError;
use graphdesk_graph::EditError;
use thiserror::Error;

/// Failure reported by the graph query service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query service unavailable: {0}")]
    Unavailable(String),
    #[error("Query rejected: {0}")]
    Rejected(String),
    #[error("Query timed out after {0} ms")]
    Timeout(u64),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Malformed result: {0}")]
    Malformed(#[from] CoreError),
}

impl QueryError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Node",
            id: id.into(),
        }
    }

    pub fn relation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Relationship",
            id: id.into(),
        }
    }
}

/// Failure talking to one of the HTTP backends (tutor, ingestion jobs).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
    /// The request succeeded but the body carries an error or lacks the
    /// expected payload.
    #[error("{endpoint} replied without a usable result: {reason}")]
    InvalidReply { endpoint: String, reason: String },
}

impl BackendError {
    pub fn invalid_reply(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReply {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("No tutor backend configured")]
    NoTutor,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StudioError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
