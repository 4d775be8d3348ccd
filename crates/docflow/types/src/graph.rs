//! Workflow graphs: the blueprint a document moves through
//!
//! A WorkflowGraph owns its nodes and connections. Graphs are authored by
//! the excluded editing layer and are read-only to the execution engine;
//! the construction and validation methods here exist for that authoring
//! layer and for tests.

use crate::{Connection, DocumentTypeId, GraphError, GraphResult, Node, NodeId, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a workflow graph
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub String);

impl GraphId {
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

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A workflow graph — nodes plus directed connections
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Unique identifier
    pub id: GraphId,
    /// The document type this graph drives
    pub document_type: DocumentTypeId,
    /// Human-readable name
    pub name: String,
    /// Whether this is the active graph for its document type
    pub is_active: bool,
    /// The nodes, in creation order
    pub nodes: Vec<Node>,
    /// The connections, in creation order
    pub connections: Vec<Connection>,
    /// When this graph was created
    pub created_at: DateTime<Utc>,
}

impl WorkflowGraph {
    /// Create a new, empty graph
    pub fn new(name: impl Into<String>, document_type: DocumentTypeId) -> Self {
        Self {
            id: GraphId::generate(),
            document_type,
            name: name.into(),
            is_active: false,
            nodes: Vec::new(),
            connections: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn activated(mut self) -> Self {
        self.is_active = true;
        self
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        let id = node.id.clone();
        self.nodes.push(node);
        Ok(id)
    }

    /// Add a connection; both endpoints must already exist
    pub fn add_connection(&mut self, connection: Connection) -> GraphResult<crate::ConnectionId> {
        if !self.nodes.iter().any(|n| n.id == connection.source) {
            return Err(GraphError::NodeNotFound(connection.source));
        }
        if !self.nodes.iter().any(|n| n.id == connection.target) {
            return Err(GraphError::NodeNotFound(connection.target));
        }
        let id = connection.id.clone();
        self.connections.push(connection);
        Ok(id)
    }

    /// Get a node by id
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Check whether a node exists
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Outgoing connections of a node, in creation order
    pub fn outgoing_connections(&self, node_id: &NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| &c.source == node_id)
            .collect()
    }

    /// All `state`-kind nodes, in creation order
    pub fn state_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::State)
    }

    /// Find the state node whose resolved state key equals `state_key`
    pub fn find_state_node(&self, state_key: &str) -> Option<&Node> {
        self.state_nodes()
            .find(|n| n.resolved_state_key() == Some(state_key))
    }

    /// Validate structural invariants: every connection's endpoints exist,
    /// node ids are unique, and resolved state keys are unique among state
    /// nodes.
    pub fn validate(&self) -> GraphResult<()> {
        if self.nodes.is_empty() {
            return Err(GraphError::Validation(
                "graph must have at least one node".into(),
            ));
        }

        let mut seen_ids = HashSet::new();
        for node in &self.nodes {
            if !seen_ids.insert(&node.id) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
        }

        for connection in &self.connections {
            if !self.contains_node(&connection.source) {
                return Err(GraphError::NodeNotFound(connection.source.clone()));
            }
            if !self.contains_node(&connection.target) {
                return Err(GraphError::NodeNotFound(connection.target.clone()));
            }
        }

        let mut seen_keys = HashSet::new();
        for node in self.state_nodes() {
            if let Some(key) = node.resolved_state_key() {
                if !seen_keys.insert(key.to_string()) {
                    return Err(GraphError::DuplicateStateKey(key.to_string()));
                }
            }
        }

        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
