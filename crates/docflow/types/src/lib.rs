//! Domain Types for Docflow
//!
//! Docflow workflows are directed graphs of states and approval gates.
//! A document moves between `state` nodes; an `approval` node in front of a
//! state is a decision point whose outgoing connections become the approval
//! buttons a reviewer sees.
//!
//! # Key Concepts
//!
//! - **WorkflowGraph**: A blueprint of nodes and connections, owned by the
//!   authoring layer and read-only to the execution engine.
//! - **Node**: A labeled point in the graph — a state, an approval gate, or
//!   another control-flow element. State and approval nodes carry explicit
//!   typed configuration; unknown config keys are preserved untouched.
//! - **Connection**: A directed edge. Connections from an approval node to a
//!   state node carry an [`ActionConfig`] that materializes as a button.
//! - **ApprovalTask**: A pending decision binding a document to an approval
//!   node, with a snapshot of available actions and assignees. Exactly one
//!   terminal resolution is permitted.
//! - **StateHistoryRecord**: An append-only audit entry for every state
//!   transition — never updated, never deleted.
//!
//! # Design Principles
//!
//! 1. The engine mutates a document's `current_state` and nothing else.
//! 2. Task action snapshots decouple in-flight tasks from graph edits.
//! 3. History is append-only and totally ordered per document.

#![deny(unsafe_code)]

mod connection;
mod directory;
mod document;
mod errors;
mod graph;
mod history;
mod node;
mod task;

pub use connection::*;
pub use directory::*;
pub use document::*;
pub use errors::*;
pub use graph::*;
pub use history::*;
pub use node::*;
pub use task::*;

/// Free-form JSON record used for document data and preserved config extras.
pub type DataMap = serde_json::Map<String, serde_json::Value>;
