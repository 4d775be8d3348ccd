//! Error types for graph construction and validation

use crate::NodeId;

/// Errors raised while building or validating a workflow graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("duplicate state key: {0}")]
    DuplicateStateKey(String),

    #[error("graph validation error: {0}")]
    Validation(String),
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
