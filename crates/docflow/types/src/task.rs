//! Approval tasks: pending decision points with action snapshots
//!
//! A task snapshots its available actions at creation time, so the buttons
//! an approver sees never change under an editor's feet. A task resolves
//! exactly once; every other pending task for the same (document, node)
//! pair is cancelled the instant one completes.

use crate::{ConnectionId, DocumentId, NodeId, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for an approval task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Task Status ──────────────────────────────────────────────────────

/// Lifecycle status of an approval task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a decision
    #[default]
    Pending,
    /// Resolved by an approver
    Completed,
    /// Superseded by a sibling task's completion
    Cancelled,
    /// Marked overdue by an external sweeper
    Expired,
}

impl TaskStatus {
    /// A task never transitions out of a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

// ── Approval Action ──────────────────────────────────────────────────

/// One approval button, derived from an approval → state connection and
/// snapshotted onto the task that presents it
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalAction {
    /// The connection this action was derived from
    pub connection_id: ConnectionId,
    /// Stable key derived from the label (lowercase, underscores)
    pub key: String,
    /// Button label
    pub label: String,
    /// Button color token
    pub button_color: String,
    /// Whether executing this action requires a comment
    pub requires_comment: bool,
    /// Ascending sort position
    pub order: i32,
    /// Icon name
    pub icon: String,
    /// The state node this action transitions to
    pub target_node_id: NodeId,
    /// Resolved state key of the target node
    pub target_state: String,
}

// ── Approval Task ────────────────────────────────────────────────────

/// A pending decision point for one document at one approval node
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalTask {
    /// Unique identifier
    pub id: TaskId,
    /// The document awaiting a decision
    pub document: DocumentId,
    /// The approval node this task was created at
    pub node: NodeId,
    /// Users the task is directly assigned to
    pub assigned_users: BTreeSet<UserId>,
    /// Roles whose holders may resolve the task
    pub assigned_roles: BTreeSet<RoleId>,
    /// Snapshot of the actions available at creation time
    pub available_actions: Vec<ApprovalAction>,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Who resolved the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<UserId>,
    /// When the task was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Key of the action taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    /// Comment supplied at resolution
    pub comment: String,
    /// When the task is due, if a timeout is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl ApprovalTask {
    /// Create a new pending task
    pub fn new(document: DocumentId, node: NodeId) -> Self {
        Self {
            id: TaskId::generate(),
            document,
            node,
            assigned_users: BTreeSet::new(),
            assigned_roles: BTreeSet::new(),
            available_actions: Vec::new(),
            status: TaskStatus::Pending,
            completed_by: None,
            completed_at: None,
            action_taken: None,
            comment: String::new(),
            due_date: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the task is still awaiting a decision
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Look up a snapshotted action by key. Duplicate keys are permitted;
    /// the first match in derived order wins.
    pub fn find_action(&self, key: &str) -> Option<&ApprovalAction> {
        self.available_actions.iter().find(|a| a.key == key)
    }

    /// Whether `user`, holding `roles`, may see this task as an assignee
    pub fn is_assigned_to(&self, user: &UserId, roles: &[RoleId]) -> bool {
        self.assigned_users.contains(user)
            || roles.iter().any(|r| self.assigned_roles.contains(r))
    }
}
