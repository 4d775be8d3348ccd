//! Workflow Execution Engine for Docflow
//!
//! The engine drives documents through an approval-gated workflow graph
//! while producing a tamper-evident audit trail. It:
//!
//! 1. Derives the legal actions at an approval gate from graph topology
//! 2. Creates approval tasks and resolves each exactly once
//! 3. Executes state transitions with full append-only history
//! 4. Evaluates state-scoped view/edit permissions, fail-closed
//! 5. Evaluates boolean gating conditions over document data
//!
//! # Key Principle
//!
//! **The engine coordinates; the store provides atomicity.** Resolving a
//! task validates against the task's action snapshot and then hands the
//! store a single compound commit — state write, history append, task
//! completion, sibling cancellation — guarded by an optimistic check
//! that the task is still pending. Of two concurrent resolutions,
//! exactly one wins; the other is rejected with `InvalidState`.
//!
//! # Architecture
//!
//! The [`WorkflowEngine`] composes specialized components:
//!
//! - [`graph_query`] — pure action derivation and key normalization
//! - [`TaskLifecycle`] — task creation, resolution, and listing
//! - [`PermissionEvaluator`] — state-scoped permission checks
//!
//! Condition evaluation is re-exported from `docflow-conditions` so the
//! API layer sees one engine surface.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docflow_engine::WorkflowEngine;
//! use docflow_store::{DocumentStore, GraphStore, InMemoryStore};
//! use docflow_types::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(InMemoryStore::new());
//!
//! let mut graph = WorkflowGraph::new("Review Flow", DocumentTypeId::new("memo")).activated();
//! let gate = graph.add_node(Node::approval("Review", ApprovalNodeConfig::new())).unwrap();
//! let done = graph.add_node(Node::state("Done", StateNodeConfig::new("DONE"))).unwrap();
//! graph.add_connection(
//!     Connection::new(gate.clone(), done).with_action(ActionConfig::new("Approve")),
//! ).unwrap();
//! store.put_graph(graph).await.unwrap();
//!
//! let document = Document::new(DocumentTypeId::new("memo"));
//! let document_id = document.id.clone();
//! store.put_document(document).await.unwrap();
//!
//! let engine = WorkflowEngine::new(store);
//! let task = engine.create_approval_task(&document_id, &gate, None).await.unwrap();
//! let history = engine
//!     .execute_approval_action(&task.id, "approve", &UserId::new("alice"), "")
//!     .await
//!     .unwrap();
//! assert_eq!(history.to_state, "DONE");
//! # });
//! ```

#![deny(unsafe_code)]

mod engine;
mod errors;
pub mod graph_query;
mod permissions;
mod tasks;
mod transition;

pub use engine::WorkflowEngine;
pub use errors::{EngineError, EngineResult};
pub use permissions::{PermissionEvaluator, PermissionKind};
pub use tasks::TaskLifecycle;

// Condition evaluation is part of the engine's surface
pub use docflow_conditions::{
    compare, evaluate_condition, evaluate_conditions, ArrayMode, CompareOp, Condition,
    ConditionLogic, VisibilityRule,
};
