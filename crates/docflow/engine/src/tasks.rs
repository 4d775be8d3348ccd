//! Approval task lifecycle: create, resolve exactly once, list
//!
//! Creation snapshots the available actions so later graph edits never
//! change an in-flight task's buttons. Resolution validates against the
//! snapshot, then hands the store one atomic commit: state transition,
//! history append, task completion, sibling cancellation. The store's
//! pending-status gate guarantees that of two concurrent resolutions of
//! the same task exactly one wins.

use crate::graph_query::derive_actions;
use crate::transition::plan_transition;
use crate::{EngineError, EngineResult};
use chrono::{Duration, Utc};
use docflow_store::{EngineStore, TaskResolution};
use docflow_types::{
    ApprovalTask, ApproverRef, DataMap, Document, DocumentId, DocumentTypeId, Node, NodeId,
    NodeKind, RoleId, StateHistoryRecord, TaskId, UserId,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Creates, resolves, and lists approval tasks
pub struct TaskLifecycle<S> {
    store: Arc<S>,
}

impl<S: EngineStore> TaskLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an approval task for a document entering an approval node.
    ///
    /// Fails with [`EngineError::Configuration`] when the node has no
    /// outgoing connections to state nodes — a gate with no exits can
    /// never be resolved. Unresolvable approver entries are skipped; a
    /// misconfigured single approver must not block task creation.
    pub async fn create_approval_task(
        &self,
        document_id: &DocumentId,
        approval_node: &NodeId,
        timeout_days: Option<i64>,
    ) -> EngineResult<ApprovalTask> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| EngineError::DocumentNotFound(document_id.clone()))?;
        let graph = self
            .store
            .graph_containing(approval_node)
            .await?
            .ok_or_else(|| EngineError::NodeNotFound(approval_node.clone()))?;
        let node = graph
            .get_node(approval_node)
            .cloned()
            .ok_or_else(|| EngineError::NodeNotFound(approval_node.clone()))?;

        if node.kind != NodeKind::Approval {
            return Err(EngineError::Configuration(format!(
                "node '{}' is not an approval node",
                node.label
            )));
        }

        let actions = derive_actions(&graph, approval_node);
        if actions.is_empty() {
            return Err(EngineError::Configuration(format!(
                "approval node '{}' has no outgoing state connections",
                node.label
            )));
        }

        let (users, roles) = self.resolve_approvers(&node, &document).await?;

        let timeout = timeout_days.or_else(|| {
            node.approval
                .as_ref()
                .and_then(|config| config.timeout_days)
        });

        let mut task = ApprovalTask::new(document.id.clone(), node.id.clone());
        task.available_actions = actions;
        task.assigned_users = users;
        task.assigned_roles = roles;
        task.due_date = timeout.map(|days| Utc::now() + Duration::days(days));

        self.store.insert_task(task.clone()).await?;
        tracing::info!(
            task_id = %task.id,
            document = %task.document,
            node = %task.node,
            actions = task.available_actions.len(),
            "approval task created"
        );
        Ok(task)
    }

    /// Execute an approval action against a pending task.
    ///
    /// Validates status, action key, and comment requirement, resolves
    /// the snapshotted target node, then commits transition + completion
    /// + sibling cancellation atomically. Returns the history record of
    /// the resulting transition.
    pub async fn execute_approval_action(
        &self,
        task_id: &TaskId,
        action_key: &str,
        actor: &UserId,
        comment: &str,
    ) -> EngineResult<StateHistoryRecord> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))?;

        if !task.is_pending() {
            return Err(EngineError::InvalidState(task.status));
        }

        let action = task
            .find_action(action_key)
            .ok_or_else(|| EngineError::ActionNotFound(action_key.to_string()))?
            .clone();

        if action.requires_comment && comment.trim().is_empty() {
            return Err(EngineError::CommentRequired(action.label.clone()));
        }

        let target_node = self
            .store
            .get_node(&action.target_node_id)
            .await?
            .ok_or_else(|| EngineError::TargetNodeMissing(action.target_node_id.clone()))?;

        let document = self
            .store
            .get_document(&task.document)
            .await?
            .ok_or_else(|| EngineError::DocumentNotFound(task.document.clone()))?;

        let mut metadata = DataMap::new();
        metadata.insert(
            "approval_task_id".to_string(),
            Value::String(task.id.to_string()),
        );
        metadata.insert(
            "approval_node_id".to_string(),
            Value::String(task.node.to_string()),
        );
        metadata.insert(
            "button_color".to_string(),
            Value::String(action.button_color.clone()),
        );

        let plan = plan_transition(
            &document,
            &target_node,
            actor,
            &action.key,
            &action.label,
            comment,
            metadata,
        );

        let resolution = TaskResolution {
            task: task.id.clone(),
            document: document.id.clone(),
            node: task.node.clone(),
            new_state: plan.to_state.clone(),
            completed_by: actor.clone(),
            completed_at: Utc::now(),
            action_taken: action.key.clone(),
            comment: comment.to_string(),
            history: plan.history.clone(),
        };

        match self.store.resolve_task(resolution).await {
            Ok(()) => {
                tracing::info!(
                    task_id = %task.id,
                    document = %document.id,
                    action = %action.key,
                    to_state = %plan.to_state,
                    "approval action executed"
                );
                Ok(plan.history)
            }
            // Another resolution won the race; report the task's current
            // terminal status
            Err(docflow_store::StoreError::Conflict(_)) => {
                let current = self
                    .store
                    .get_task(task_id)
                    .await?
                    .ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))?;
                Err(EngineError::InvalidState(current.status))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Pending tasks a user may act on: directly assigned plus assigned
    /// to any role the user holds, deduplicated, newest first.
    pub async fn list_pending_approvals(
        &self,
        user: &UserId,
        document_type: Option<&DocumentTypeId>,
    ) -> EngineResult<Vec<ApprovalTask>> {
        let roles = self.store.roles_of(user).await?;
        let mut tasks = self.store.pending_tasks_assigned(user, &roles).await?;

        if let Some(document_type) = document_type {
            let mut filtered = Vec::with_capacity(tasks.len());
            for task in tasks {
                let document = self.store.get_document(&task.document).await?;
                if document.is_some_and(|d| &d.document_type == document_type) {
                    filtered.push(task);
                }
            }
            tasks = filtered;
        }

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    /// Resolve the configured approvers of a node for a document.
    async fn resolve_approvers(
        &self,
        node: &Node,
        document: &Document,
    ) -> EngineResult<(BTreeSet<UserId>, BTreeSet<RoleId>)> {
        let mut users = BTreeSet::new();
        let mut roles = BTreeSet::new();

        let Some(config) = node.approval.as_ref() else {
            return Ok((users, roles));
        };

        for approver in &config.default_approvers {
            match approver {
                ApproverRef::User { user_id } => {
                    if self.store.get_user(user_id).await?.is_some() {
                        users.insert(user_id.clone());
                    } else {
                        tracing::debug!(user = %user_id, "skipping unresolvable approver user");
                    }
                }
                ApproverRef::Role { role_id } => {
                    if self.store.get_role(role_id).await?.is_some() {
                        roles.insert(role_id.clone());
                    } else {
                        tracing::debug!(role = %role_id, "skipping unresolvable approver role");
                    }
                }
                ApproverRef::SubmitterManager => {
                    let manager = match &document.submitted_by {
                        Some(submitter) => self
                            .store
                            .get_user(submitter)
                            .await?
                            .and_then(|u| u.manager),
                        None => None,
                    };
                    match manager {
                        Some(manager) if self.store.get_user(&manager).await?.is_some() => {
                            users.insert(manager);
                        }
                        _ => {
                            tracing::debug!(
                                document = %document.id,
                                "submitter has no resolvable manager; skipping"
                            );
                        }
                    }
                }
            }
        }

        Ok((users, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_store::{DocumentStore, GraphStore, InMemoryStore, TaskStore};
    use docflow_types::{
        ActionConfig, ApprovalNodeConfig, Connection, Role, StateNodeConfig, TaskStatus, User,
        WorkflowGraph,
    };

    struct Fixture {
        store: Arc<InMemoryStore>,
        lifecycle: TaskLifecycle<InMemoryStore>,
        document: DocumentId,
        approval: NodeId,
    }

    /// Approval node "UH Approval" with two exits: "Approve" →
    /// UH_APPROVED and "Reject" → UH_REJECTED (comment required).
    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());

        let mut graph =
            WorkflowGraph::new("Requisition Flow", DocumentTypeId::new("requisition")).activated();
        let approval = graph
            .add_node(Node::approval("UH Approval", ApprovalNodeConfig::new()))
            .unwrap();
        let approved = graph
            .add_node(Node::state("Approved", StateNodeConfig::new("UH_APPROVED")))
            .unwrap();
        let rejected = graph
            .add_node(Node::state("Rejected", StateNodeConfig::new("UH_REJECTED")))
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), approved)
                    .with_action(ActionConfig::new("Approve").with_color("success").with_order(1)),
            )
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), rejected).with_action(
                    ActionConfig::new("Reject")
                        .with_color("error")
                        .with_order(2)
                        .requires_comment(),
                ),
            )
            .unwrap();
        store.put_graph(graph).await.unwrap();

        let submitter = UserId::new("submitter");
        store.seed_user(User::new(submitter.clone(), "submitter")).unwrap();
        let document = Document::new(DocumentTypeId::new("requisition"))
            .with_submitter(submitter)
            .with_state("UH_PENDING");
        let document_id = document.id.clone();
        store.put_document(document).await.unwrap();

        Fixture {
            lifecycle: TaskLifecycle::new(store.clone()),
            store,
            document: document_id,
            approval,
        }
    }

    #[tokio::test]
    async fn test_create_task_snapshots_actions() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.available_actions.len(), 2);
        assert_eq!(task.available_actions[0].key, "approve");
        assert_eq!(task.available_actions[1].key, "reject");
        assert!(task.available_actions[1].requires_comment);
        assert!(task.due_date.is_none());
    }

    #[tokio::test]
    async fn test_create_task_fails_without_state_exits() {
        let f = fixture().await;
        let mut graph =
            WorkflowGraph::new("Dead End", DocumentTypeId::new("requisition")).activated();
        let lonely = graph
            .add_node(Node::approval("Lonely", ApprovalNodeConfig::new()))
            .unwrap();
        f.store.put_graph(graph).await.unwrap();

        let result = f
            .lifecycle
            .create_approval_task(&f.document, &lonely, None)
            .await;
        match result {
            Err(EngineError::Configuration(message)) => {
                assert!(message.contains("no outgoing state connections"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_due_date_from_config_and_override() {
        let f = fixture().await;

        // Rebuild the approval node with a configured timeout
        let mut graph =
            WorkflowGraph::new("Timed", DocumentTypeId::new("requisition")).activated();
        let approval = graph
            .add_node(Node::approval(
                "Timed Review",
                ApprovalNodeConfig::new().with_timeout_days(5),
            ))
            .unwrap();
        let state = graph
            .add_node(Node::state("Done", StateNodeConfig::new("DONE")))
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), state).with_action(ActionConfig::new("Finish")),
            )
            .unwrap();
        f.store.put_graph(graph).await.unwrap();

        let configured = f
            .lifecycle
            .create_approval_task(&f.document, &approval, None)
            .await
            .unwrap();
        let due = configured.due_date.expect("config timeout should set a due date");
        assert!(due > Utc::now() + Duration::days(4));

        let overridden = f
            .lifecycle
            .create_approval_task(&f.document, &approval, Some(1))
            .await
            .unwrap();
        let due = overridden.due_date.unwrap();
        assert!(due < Utc::now() + Duration::days(2));
    }

    #[tokio::test]
    async fn test_approver_resolution_skips_unresolvable() {
        let f = fixture().await;
        let manager = UserId::new("mgr");
        f.store.seed_user(User::new(manager.clone(), "manager")).unwrap();
        // Re-point the submitter at the manager
        f.store
            .seed_user(User::new(UserId::new("submitter"), "submitter").with_manager(manager.clone()))
            .unwrap();
        f.store
            .seed_role(Role::new(RoleId::new("finance"), "Finance"))
            .unwrap();

        let mut graph =
            WorkflowGraph::new("Approvers", DocumentTypeId::new("requisition")).activated();
        let approval = graph
            .add_node(Node::approval(
                "Review",
                ApprovalNodeConfig::new()
                    .with_approver(ApproverRef::User {
                        user_id: UserId::new("ghost"),
                    })
                    .with_approver(ApproverRef::Role {
                        role_id: RoleId::new("finance"),
                    })
                    .with_approver(ApproverRef::SubmitterManager),
            ))
            .unwrap();
        let state = graph
            .add_node(Node::state("Done", StateNodeConfig::new("DONE")))
            .unwrap();
        graph
            .add_connection(
                Connection::new(approval.clone(), state).with_action(ActionConfig::new("Finish")),
            )
            .unwrap();
        f.store.put_graph(graph).await.unwrap();

        let task = f
            .lifecycle
            .create_approval_task(&f.document, &approval, None)
            .await
            .unwrap();

        // The ghost user is skipped, the role and the manager resolve
        assert!(task.assigned_users.contains(&manager));
        assert_eq!(task.assigned_users.len(), 1);
        assert!(task.assigned_roles.contains(&RoleId::new("finance")));
    }

    #[tokio::test]
    async fn test_execute_reject_requires_comment() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        let actor = UserId::new("approver");
        let blank = f
            .lifecycle
            .execute_approval_action(&task.id, "reject", &actor, "  ")
            .await;
        assert!(matches!(blank, Err(EngineError::CommentRequired(_))));

        let history = f
            .lifecycle
            .execute_approval_action(&task.id, "reject", &actor, "not eligible")
            .await
            .unwrap();
        assert_eq!(history.from_state, "UH_PENDING");
        assert_eq!(history.to_state, "UH_REJECTED");
        assert_eq!(history.comment, "not eligible");

        let document = f.store.get_document(&f.document).await.unwrap().unwrap();
        assert_eq!(document.current_state, "UH_REJECTED");
        let stored = f.store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.completed_by, Some(actor));
        assert_eq!(stored.action_taken.as_deref(), Some("reject"));
    }

    #[tokio::test]
    async fn test_execute_unknown_action() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        let result = f
            .lifecycle
            .execute_approval_action(&task.id, "escalate", &UserId::new("u"), "")
            .await;
        assert!(matches!(result, Err(EngineError::ActionNotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_on_resolved_task() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();
        let actor = UserId::new("approver");

        f.lifecycle
            .execute_approval_action(&task.id, "approve", &actor, "")
            .await
            .unwrap();

        let again = f
            .lifecycle
            .execute_approval_action(&task.id, "approve", &actor, "")
            .await;
        assert!(matches!(
            again,
            Err(EngineError::InvalidState(TaskStatus::Completed))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_resolution_is_exactly_once() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let first = f.lifecycle.execute_approval_action(
            &task.id,
            "approve",
            &alice,
            "",
        );
        let second = f.lifecycle.execute_approval_action(
            &task.id,
            "reject",
            &bob,
            "duplicate spend",
        );
        let (first, second) = tokio::join!(first, second);

        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let loser = if outcomes[0] { second } else { first };
        assert!(matches!(loser, Err(EngineError::InvalidState(_))));

        // Exactly one history row, and the document matches the winner
        let history = f.store.history_for_document(&f.document).await.unwrap();
        assert_eq!(history.len(), 1);
        let document = f.store.get_document(&f.document).await.unwrap().unwrap();
        assert_eq!(document.current_state, history[0].to_state);
    }

    #[tokio::test]
    async fn test_sibling_cancellation_on_completion() {
        let f = fixture().await;
        let winner = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();
        let sibling = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        f.lifecycle
            .execute_approval_action(&winner.id, "approve", &UserId::new("u"), "")
            .await
            .unwrap();

        let sibling = f.store.get_task(&sibling.id).await.unwrap().unwrap();
        assert_eq!(sibling.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_execute_records_metadata() {
        let f = fixture().await;
        let task = f
            .lifecycle
            .create_approval_task(&f.document, &f.approval, None)
            .await
            .unwrap();

        let history = f
            .lifecycle
            .execute_approval_action(&task.id, "approve", &UserId::new("u"), "")
            .await
            .unwrap();

        assert_eq!(
            history.metadata.get("approval_task_id").unwrap(),
            &Value::String(task.id.to_string())
        );
        assert_eq!(
            history.metadata.get("button_color").unwrap(),
            &Value::String("success".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_pending_approvals() {
        let f = fixture().await;
        let user = UserId::new("reviewer");
        let role = RoleId::new("finance");
        f.store.seed_user(User::new(user.clone(), "reviewer")).unwrap();
        f.store.seed_role(Role::new(role.clone(), "Finance")).unwrap();
        f.store.grant_role(&user, &role).unwrap();

        let mut direct = ApprovalTask::new(f.document.clone(), f.approval.clone());
        direct.assigned_users.insert(user.clone());
        direct.created_at = Utc::now() - Duration::minutes(5);
        let mut via_role = ApprovalTask::new(f.document.clone(), f.approval.clone());
        via_role.assigned_roles.insert(role.clone());
        // Assigned both directly and via role: must appear once
        let mut both = ApprovalTask::new(f.document.clone(), f.approval.clone());
        both.assigned_users.insert(user.clone());
        both.assigned_roles.insert(role);
        both.created_at = Utc::now() - Duration::minutes(10);

        for task in [&direct, &via_role, &both] {
            f.store.insert_task((*task).clone()).await.unwrap();
        }

        let pending = f.lifecycle.list_pending_approvals(&user, None).await.unwrap();
        assert_eq!(pending.len(), 3);
        // Newest first
        assert_eq!(pending[0].id, via_role.id);
        assert_eq!(pending[2].id, both.id);

        // Document-type filter
        let none = f
            .lifecycle
            .list_pending_approvals(&user, Some(&DocumentTypeId::new("other")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
