//! The workflow engine facade: the full surface consumed by the API layer
//!
//! The engine composes specialized components over one shared store:
//! action derivation, the approval task lifecycle, and the permission
//! evaluator. It coordinates — the store provides atomicity, the graph
//! provides topology, and callers provide actors.

use crate::permissions::{PermissionEvaluator, PermissionKind};
use crate::tasks::TaskLifecycle;
use crate::{graph_query, EngineError, EngineResult};
use docflow_store::EngineStore;
use docflow_types::{
    ApprovalAction, ApprovalTask, DocumentId, DocumentTypeId, NodeId, StateHistoryRecord, TaskId,
    UserId,
};
use std::sync::Arc;

/// The Docflow workflow execution engine
pub struct WorkflowEngine<S> {
    store: Arc<S>,
    tasks: TaskLifecycle<S>,
    permissions: PermissionEvaluator<S>,
}

impl<S: EngineStore> WorkflowEngine<S> {
    /// Create an engine over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            tasks: TaskLifecycle::new(store.clone()),
            permissions: PermissionEvaluator::new(store.clone()),
            store,
        }
    }

    /// The legal actions available at an approval node, in button order
    pub async fn derive_actions(&self, approval_node: &NodeId) -> EngineResult<Vec<ApprovalAction>> {
        let graph = self
            .store
            .graph_containing(approval_node)
            .await?
            .ok_or_else(|| EngineError::NodeNotFound(approval_node.clone()))?;
        Ok(graph_query::derive_actions(&graph, approval_node))
    }

    /// Create an approval task for a document entering an approval node
    pub async fn create_approval_task(
        &self,
        document: &DocumentId,
        approval_node: &NodeId,
        timeout_days: Option<i64>,
    ) -> EngineResult<ApprovalTask> {
        self.tasks
            .create_approval_task(document, approval_node, timeout_days)
            .await
    }

    /// Resolve a pending task with one of its snapshotted actions
    pub async fn execute_approval_action(
        &self,
        task: &TaskId,
        action_key: &str,
        actor: &UserId,
        comment: &str,
    ) -> EngineResult<StateHistoryRecord> {
        self.tasks
            .execute_approval_action(task, action_key, actor, comment)
            .await
    }

    /// Pending tasks a user may act on, newest first
    pub async fn list_pending_approvals(
        &self,
        user: &UserId,
        document_type: Option<&DocumentTypeId>,
    ) -> EngineResult<Vec<ApprovalTask>> {
        self.tasks.list_pending_approvals(user, document_type).await
    }

    /// State-scoped permission check; fail-closed, never errors
    pub async fn check_permission(
        &self,
        document: &DocumentId,
        user: &UserId,
        kind: PermissionKind,
    ) -> bool {
        self.permissions.check_permission(document, user, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_store::{DocumentStore, GraphStore, InMemoryStore};
    use docflow_types::{
        ActionConfig, ApprovalNodeConfig, Connection, Document, Node, StateNodeConfig,
        StatePermissions, TaskStatus, ViewPermissions, WorkflowGraph,
    };

    /// End-to-end: submit → pending at "UH Approval" → reject with a
    /// comment → document lands in UH_REJECTED with one history row.
    #[tokio::test]
    async fn test_end_to_end_rejection() {
        let store = Arc::new(InMemoryStore::new());
        let engine = WorkflowEngine::new(store.clone());

        let mut graph =
            WorkflowGraph::new("Requisition Flow", DocumentTypeId::new("requisition"))
                .activated();
        let approval = graph
            .add_node(Node::approval("UH Approval", ApprovalNodeConfig::new()))
            .unwrap();
        let approved = graph
            .add_node(Node::state(
                "Approved",
                StateNodeConfig::new("UH_APPROVED").with_permissions(StatePermissions {
                    view: ViewPermissions {
                        include_submitter: true,
                        ..Default::default()
                    },
                    ..Default::default()
                }),
            ))
            .unwrap();
        let rejected = graph
            .add_node(Node::state(
                "Rejected",
                StateNodeConfig::new("UH_REJECTED").with_permissions(StatePermissions {
                    view: ViewPermissions {
                        include_submitter: true,
                        ..Default::default()
                    },
                    ..Default::default()
                }),
            ))
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), approved)
                    .with_action(ActionConfig::new("Approve").with_order(1)),
            )
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), rejected)
                    .with_action(ActionConfig::new("Reject").with_order(2).requires_comment()),
            )
            .unwrap();
        store.put_graph(graph).await.unwrap();

        let submitter = UserId::new("submitter");
        store
            .seed_user(docflow_types::User::new(submitter.clone(), "submitter"))
            .unwrap();
        let document = Document::new(DocumentTypeId::new("requisition"))
            .with_submitter(submitter.clone())
            .with_state("UH_PENDING");
        let document_id = document.id.clone();
        store.put_document(document).await.unwrap();

        // Buttons derive from topology
        let actions = engine.derive_actions(&approval).await.unwrap();
        assert_eq!(actions.len(), 2);

        let task = engine
            .create_approval_task(&document_id, &approval, None)
            .await
            .unwrap();

        // Reject without a comment is refused
        let reviewer = UserId::new("reviewer");
        let refused = engine
            .execute_approval_action(&task.id, "reject", &reviewer, "")
            .await;
        assert!(matches!(refused, Err(EngineError::CommentRequired(_))));

        // Reject with a comment goes through
        let history = engine
            .execute_approval_action(&task.id, "reject", &reviewer, "not eligible")
            .await
            .unwrap();
        assert_eq!(history.to_state, "UH_REJECTED");

        let document = store.get_document(&document_id).await.unwrap().unwrap();
        assert_eq!(document.current_state, "UH_REJECTED");

        let pending = engine
            .list_pending_approvals(&reviewer, None)
            .await
            .unwrap();
        assert!(pending.is_empty());

        let stored = docflow_store::TaskStore::get_task(store.as_ref(), &task.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);

        // The submitter can view the rejected document
        assert!(
            engine
                .check_permission(&document_id, &submitter, PermissionKind::View)
                .await
        );
    }
}
