//! Documents: the records driven through a workflow graph
//!
//! Document records are owned by the excluded persistence layer; the
//! engine's only write into them is the `current_state` field, and that
//! write always travels together with a history append.

use crate::{DataMap, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a document
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
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

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a document type (collection)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentTypeId(pub String);

impl DocumentTypeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DocumentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document moving through a workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// The document type whose active graph drives this document
    pub document_type: DocumentTypeId,
    /// Who submitted the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<UserId>,
    /// Free-form form data
    pub data: DataMap,
    /// Resolved state key of the document's current state; empty for a
    /// document that has not yet entered the workflow
    pub current_state: String,
    /// When the document was created
    pub created_at: DateTime<Utc>,
    /// When the document was last updated
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document with no state
    pub fn new(document_type: DocumentTypeId) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            document_type,
            submitted_by: None,
            data: DataMap::new(),
            current_state: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_submitter(mut self, user: UserId) -> Self {
        self.submitted_by = Some(user);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.current_state = state.into();
        self
    }

    /// Whether the document has entered its workflow
    pub fn is_in_workflow(&self) -> bool {
        !self.current_state.is_empty()
    }
}
