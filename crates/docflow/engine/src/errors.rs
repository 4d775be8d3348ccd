//! Error types for engine operations

use docflow_store::StoreError;
use docflow_types::{DocumentId, NodeId, TaskId, TaskStatus};

/// Errors surfaced by the workflow execution engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The graph is structurally insufficient to proceed — fatal to the
    /// triggering operation, never silently retried
    #[error("workflow configuration error: {0}")]
    Configuration(String),

    /// The task is not in the status the operation expects
    #[error("approval task is already {0}")]
    InvalidState(TaskStatus),

    /// The requested action key is not in the task's snapshot — a stale
    /// client or a concurrent graph edit
    #[error("action '{0}' not found in available actions")]
    ActionNotFound(String),

    /// The snapshotted action's target node no longer exists
    #[error("target node not found: {0}")]
    TargetNodeMissing(NodeId),

    /// The matched action requires a comment and none was supplied
    #[error("action '{0}' requires a comment")]
    CommentRequired(String),

    #[error("workflow node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("approval task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
