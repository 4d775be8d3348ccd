//! State history: the append-only audit trail
//!
//! One record per state transition, written in the same atomic unit as the
//! document's state change. Records are never updated or deleted; ordering
//! is total per document by creation time.

use crate::{DataMap, DocumentId, NodeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a history record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(pub String);

impl HistoryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An append-only record of one state transition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistoryRecord {
    /// Unique identifier
    pub id: HistoryId,
    /// The document that transitioned
    pub document: DocumentId,
    /// State before the transition; empty for a document's first transition
    pub from_state: String,
    /// State after the transition
    pub to_state: String,
    /// Who triggered the transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitioned_by: Option<UserId>,
    /// Key of the approval button clicked, if any
    pub action_key: String,
    /// Label of the approval button clicked, if any
    pub action_label: String,
    /// Comment supplied with the action
    pub comment: String,
    /// The target state node of the transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Additional context (task id, approval node, button color)
    #[serde(default, skip_serializing_if = "DataMap::is_empty")]
    pub metadata: DataMap,
    /// When the transition happened
    pub created_at: DateTime<Utc>,
}

impl StateHistoryRecord {
    /// Create a new record for a transition
    pub fn new(
        document: DocumentId,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
    ) -> Self {
        Self {
            id: HistoryId::generate(),
            document,
            from_state: from_state.into(),
            to_state: to_state.into(),
            transitioned_by: None,
            action_key: String::new(),
            action_label: String::new(),
            comment: String::new(),
            node: None,
            metadata: DataMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.transitioned_by = Some(actor);
        self
    }

    pub fn with_action(
        mut self,
        key: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.action_key = key.into();
        self.action_label = label.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_metadata(mut self, metadata: DataMap) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_transition_has_empty_from_state() {
        let record = StateHistoryRecord::new(DocumentId::generate(), "", "DRAFT")
            .with_actor(UserId::new("u-1"))
            .with_action("submit", "Submit");

        assert_eq!(record.from_state, "");
        assert_eq!(record.to_state, "DRAFT");
        assert_eq!(record.action_key, "submit");
        assert_eq!(record.transitioned_by, Some(UserId::new("u-1")));
    }
}
