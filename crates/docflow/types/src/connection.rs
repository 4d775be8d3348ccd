//! Workflow connections: directed edges with optional action metadata
//!
//! A connection from an approval node to a state node is what materializes
//! into an approval button. Its [`ActionConfig`] carries the button's
//! presentation and the comment requirement enforced at execution time.

use crate::{DataMap, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a connection
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge between two nodes in a workflow graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier
    pub id: ConnectionId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Button configuration for approval → state connections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionConfig>,
    /// When the connection was created; breaks ordering ties between
    /// actions with the same `order`
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// Create a new connection
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: ConnectionId::generate(),
            source,
            target,
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: ActionConfig) -> Self {
        self.action = Some(action);
        self
    }
}

/// Button configuration carried by an approval → state connection
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionConfig {
    /// Button label; the action key is derived from it
    pub label: String,
    /// Button color token for the UI
    pub button_color: String,
    /// Whether resolving with this action requires a comment
    pub requires_comment: bool,
    /// Ascending sort position among sibling buttons
    pub order: i32,
    /// Icon name for the UI
    pub icon: String,
    /// Uninterpreted keys, preserved verbatim
    #[serde(flatten)]
    pub extra: DataMap,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            label: "Action".to_string(),
            button_color: "primary".to_string(),
            requires_comment: false,
            order: 1,
            icon: String::new(),
            extra: DataMap::new(),
        }
    }
}

impl ActionConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.button_color = color.into();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn requires_comment(mut self) -> Self {
        self.requires_comment = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_builder() {
        let conn = Connection::new(NodeId::new("a"), NodeId::new("b"))
            .with_action(ActionConfig::new("Approve").with_color("success").with_order(2));

        let action = conn.action.unwrap();
        assert_eq!(action.label, "Approve");
        assert_eq!(action.button_color, "success");
        assert_eq!(action.order, 2);
        assert!(!action.requires_comment);
    }

    #[test]
    fn test_action_config_defaults() {
        let config: ActionConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.label, "Action");
        assert_eq!(config.button_color, "primary");
        assert_eq!(config.order, 1);
    }

    #[test]
    fn test_action_config_extra_preserved() {
        let config: ActionConfig =
            serde_json::from_value(json!({"label": "Reject", "confirmText": "Are you sure?"}))
                .unwrap();
        assert_eq!(config.extra.get("confirmText").unwrap(), "Are you sure?");
    }
}
