//! Write payloads for compound store operations

use chrono::{DateTime, Utc};
use docflow_types::{DocumentId, NodeId, StateHistoryRecord, TaskId, UserId};

/// Everything applied when an approval task resolves.
///
/// The store must apply the whole payload in one atomic unit, guarded by
/// a check that the task is still pending: the document's state write,
/// the history append, the winning task's completion, and the
/// cancellation of every other pending task for the same
/// `(document, node)` pair. If the task is no longer pending the store
/// rejects the payload with [`crate::StoreError::Conflict`] and applies
/// nothing.
#[derive(Clone, Debug)]
pub struct TaskResolution {
    /// The winning task
    pub task: TaskId,
    /// The document being transitioned
    pub document: DocumentId,
    /// The approval node scoping sibling cancellation
    pub node: NodeId,
    /// The document's new current state
    pub new_state: String,
    /// Who resolved the task
    pub completed_by: UserId,
    /// When the task was resolved
    pub completed_at: DateTime<Utc>,
    /// Key of the action taken
    pub action_taken: String,
    /// Comment supplied by the approver
    pub comment: String,
    /// The audit record to append
    pub history: StateHistoryRecord,
}
