//! Workflow nodes: states, approval gates, and control-flow elements
//!
//! Node configuration is typed per kind. A `state` node carries a
//! [`StateNodeConfig`] (state key + per-state permissions); an `approval`
//! node carries an [`ApprovalNodeConfig`] (default approvers + timeout).
//! Keys the engine does not interpret are preserved in `extra` so that a
//! round-trip through the engine never loses authoring-layer data.

use crate::{DataMap, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a workflow node
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Node Kind ────────────────────────────────────────────────────────

/// The kind of a workflow node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point when a document is submitted
    Start,
    /// A lifecycle state; its resolved state key becomes the document's
    /// `current_state` value
    State,
    /// Terminal node
    End,
    /// Approval gate — outgoing connections to state nodes become buttons
    Approval,
    /// Branch on document data
    Condition,
    /// In-app notification
    Notification,
    /// Wait for a duration
    Timer,
    /// Child form data entry
    ChildFormEntry,
    /// Document visibility marker
    ViewPermission,
    /// Outbound email
    Email,
    /// Outbound webhook call
    Webhook,
    /// Split into parallel paths
    Fork,
    /// Merge parallel paths
    Join,
}

// ── Node ─────────────────────────────────────────────────────────────

/// A node in the workflow graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity; referenced by tasks and history records
    pub id: NodeId,
    /// Node kind
    pub kind: NodeKind,
    /// Human-readable label
    pub label: String,
    /// Configuration for `state` nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateNodeConfig>,
    /// Configuration for `approval` nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalNodeConfig>,
    /// Uninterpreted configuration, preserved verbatim
    #[serde(default, skip_serializing_if = "DataMap::is_empty")]
    pub extra: DataMap,
    /// When the node was created
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node of the given kind
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            kind,
            label: label.into(),
            state: None,
            approval: None,
            extra: DataMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a start node
    pub fn start() -> Self {
        Self::new(NodeKind::Start, "Start")
    }

    /// Create an end node
    pub fn end() -> Self {
        Self::new(NodeKind::End, "End")
    }

    /// Create a state node with its configuration
    pub fn state(label: impl Into<String>, config: StateNodeConfig) -> Self {
        let mut node = Self::new(NodeKind::State, label);
        node.state = Some(config);
        node
    }

    /// Create an approval node with its configuration
    pub fn approval(label: impl Into<String>, config: ApprovalNodeConfig) -> Self {
        let mut node = Self::new(NodeKind::Approval, label);
        node.approval = Some(config);
        node
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The stable state key of a `state` node: the configured `stateKey`,
    /// falling back to the node's label when absent or empty.
    ///
    /// Returns `None` for any other node kind.
    pub fn resolved_state_key(&self) -> Option<&str> {
        if self.kind != NodeKind::State {
            return None;
        }
        match self.state.as_ref().and_then(|c| c.state_key.as_deref()) {
            Some(key) if !key.is_empty() => Some(key),
            _ => Some(self.label.as_str()),
        }
    }
}

// ── State Node Configuration ─────────────────────────────────────────

fn default_config_version() -> u32 {
    1
}

/// Configuration carried by a `state` node
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateNodeConfig {
    /// Config shape version
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Unique label of this state within its graph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// View/edit rules scoped to this state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<StatePermissions>,
    /// Uninterpreted keys, preserved verbatim
    #[serde(flatten)]
    pub extra: DataMap,
}

impl Default for StateNodeConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            state_key: None,
            permissions: None,
            extra: DataMap::new(),
        }
    }
}

impl StateNodeConfig {
    pub fn new(state_key: impl Into<String>) -> Self {
        Self {
            state_key: Some(state_key.into()),
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, permissions: StatePermissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

// ── Approval Node Configuration ──────────────────────────────────────

/// Configuration carried by an `approval` node
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalNodeConfig {
    /// Config shape version
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Who should decide at this gate
    pub default_approvers: Vec<ApproverRef>,
    /// Days until the task is due
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_days: Option<i64>,
    /// Uninterpreted keys, preserved verbatim
    #[serde(flatten)]
    pub extra: DataMap,
}

impl Default for ApprovalNodeConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            default_approvers: Vec::new(),
            timeout_days: None,
            extra: DataMap::new(),
        }
    }
}

impl ApprovalNodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_approver(mut self, approver: ApproverRef) -> Self {
        self.default_approvers.push(approver);
        self
    }

    pub fn with_timeout_days(mut self, days: i64) -> Self {
        self.timeout_days = Some(days);
        self
    }
}

/// A reference to someone who may resolve an approval task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApproverRef {
    /// A specific user
    User {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// Every holder of a role
    Role {
        #[serde(rename = "roleId")]
        role_id: RoleId,
    },
    /// The configured manager of the document's submitter
    SubmitterManager,
}

// ── State Permissions ────────────────────────────────────────────────

/// Per-state view/edit rules read by the permission evaluator
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatePermissions {
    /// Who may view the document while it is in this state
    pub view: ViewPermissions,
    /// Whether the main form may be edited in this state
    pub edit_main_form: bool,
    /// Role allow-list for main-form editing (empty = unrestricted)
    pub edit_main_form_roles: Vec<RoleId>,
    /// User allow-list for main-form editing (empty = unrestricted)
    pub edit_main_form_users: Vec<UserId>,
    /// Whether child forms may be edited in this state
    pub edit_child_forms: bool,
    /// Role allow-list for child-form editing (empty = unrestricted)
    pub edit_child_forms_roles: Vec<RoleId>,
    /// User allow-list for child-form editing (empty = unrestricted)
    pub edit_child_forms_users: Vec<UserId>,
}

/// Who may view a document in a given state
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewPermissions {
    /// Grant view to the document's submitter
    pub include_submitter: bool,
    /// Grant view to anyone with an approval task recorded for the document
    pub include_approvers: bool,
    /// Explicit role grants
    pub roles: Vec<RoleId>,
    /// Explicit user grants
    pub users: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_key_resolution() {
        let node = Node::state("Approved", StateNodeConfig::new("UH_APPROVED"));
        assert_eq!(node.resolved_state_key(), Some("UH_APPROVED"));

        // Falls back to the label when the key is absent or empty
        let node = Node::state("Approved", StateNodeConfig::default());
        assert_eq!(node.resolved_state_key(), Some("Approved"));

        let mut config = StateNodeConfig::default();
        config.state_key = Some(String::new());
        let node = Node::state("Approved", config);
        assert_eq!(node.resolved_state_key(), Some("Approved"));

        // Only state nodes resolve a state key
        let node = Node::approval("Review", ApprovalNodeConfig::new());
        assert_eq!(node.resolved_state_key(), None);
    }

    #[test]
    fn test_node_constructors() {
        let start = Node::start();
        assert_eq!(start.kind, NodeKind::Start);
        assert!(start.state.is_none());

        let approval = Node::approval(
            "UH Approval",
            ApprovalNodeConfig::new()
                .with_approver(ApproverRef::SubmitterManager)
                .with_timeout_days(5),
        );
        assert_eq!(approval.kind, NodeKind::Approval);
        let config = approval.approval.unwrap();
        assert_eq!(config.timeout_days, Some(5));
        assert_eq!(config.default_approvers.len(), 1);
    }

    #[test]
    fn test_approver_ref_wire_format() {
        let user = ApproverRef::User {
            user_id: UserId::new("u-1"),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"type": "user", "userId": "u-1"}));

        let manager: ApproverRef =
            serde_json::from_value(json!({"type": "submitter_manager"})).unwrap();
        assert_eq!(manager, ApproverRef::SubmitterManager);
    }

    #[test]
    fn test_unknown_config_keys_preserved() {
        let raw = json!({
            "stateKey": "DRAFT",
            "ui": {"color": "orange", "x": 100},
        });
        let config: StateNodeConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(config.state_key.as_deref(), Some("DRAFT"));
        assert_eq!(config.extra.get("ui").unwrap()["color"], "orange");

        let round_tripped = serde_json::to_value(&config).unwrap();
        assert_eq!(round_tripped["ui"]["x"], 100);
    }
}
