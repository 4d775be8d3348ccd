//! In-memory reference implementation of the Docflow store traits.
//!
//! Deterministic and test-friendly. All tables live behind one lock so
//! that [`TaskStore::resolve_task`] is a genuine atomic unit: the
//! pending-status check, the document write, the history append, the
//! task completion, and sibling cancellation commit together or not at
//! all. A transactional backend provides the same guarantee with a
//! database transaction instead.

use crate::model::TaskResolution;
use crate::traits::{Directory, DocumentStore, GraphStore, TaskStore};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use docflow_types::{
    ApprovalTask, Document, DocumentId, DocumentTypeId, GraphId, Node, NodeId, Role, RoleId,
    StateHistoryRecord, TaskId, TaskStatus, User, UserId, WorkflowGraph,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct StoreInner {
    graphs: HashMap<GraphId, WorkflowGraph>,
    documents: HashMap<DocumentId, Document>,
    tasks: HashMap<TaskId, ApprovalTask>,
    history: Vec<StateHistoryRecord>,
    users: HashMap<UserId, User>,
    roles: HashMap<RoleId, Role>,
    user_roles: HashMap<UserId, Vec<RoleId>>,
}

/// In-memory Docflow store and directory adapter.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    // ── Directory seeding ────────────────────────────────────────────
    // Provisioning is out of the engine's scope; these exist for the
    // embedding application and for tests.

    pub fn seed_user(&self, user: User) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn seed_role(&self, role: Role) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn grant_role(&self, user: &UserId, role: &RoleId) -> StoreResult<()> {
        let mut inner = self.write()?;
        let roles = inner.user_roles.entry(user.clone()).or_default();
        if !roles.contains(role) {
            roles.push(role.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn put_graph(&self, graph: WorkflowGraph) -> StoreResult<()> {
        graph
            .validate()
            .map_err(|e| StoreError::InvalidInput(e.to_string()))?;
        let mut inner = self.write()?;
        inner.graphs.insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn get_graph(&self, id: &GraphId) -> StoreResult<Option<WorkflowGraph>> {
        Ok(self.read()?.graphs.get(id).cloned())
    }

    async fn active_graph_for(
        &self,
        document_type: &DocumentTypeId,
    ) -> StoreResult<Option<WorkflowGraph>> {
        let inner = self.read()?;
        Ok(inner
            .graphs
            .values()
            .filter(|g| g.is_active && &g.document_type == document_type)
            .max_by_key(|g| g.created_at)
            .cloned())
    }

    async fn graph_containing(&self, node: &NodeId) -> StoreResult<Option<WorkflowGraph>> {
        let inner = self.read()?;
        Ok(inner
            .graphs
            .values()
            .find(|g| g.contains_node(node))
            .cloned())
    }

    async fn get_node(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        let inner = self.read()?;
        Ok(inner
            .graphs
            .values()
            .find_map(|g| g.get_node(id))
            .cloned())
    }

    async fn remove_node(&self, graph: &GraphId, node: &NodeId) -> StoreResult<()> {
        let mut inner = self.write()?;

        let referenced = inner
            .tasks
            .values()
            .any(|t| &t.node == node && t.status == TaskStatus::Pending);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "node {} is referenced by a pending approval task",
                node
            )));
        }

        let graph = inner
            .graphs
            .get_mut(graph)
            .ok_or_else(|| StoreError::NotFound(format!("graph {} not found", graph)))?;
        if !graph.contains_node(node) {
            return Err(StoreError::NotFound(format!("node {} not found", node)));
        }
        graph.nodes.retain(|n| &n.id != node);
        graph
            .connections
            .retain(|c| &c.source != node && &c.target != node);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn put_document(&self, document: Document) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn get_document(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    async fn history_for_document(
        &self,
        document: &DocumentId,
    ) -> StoreResult<Vec<StateHistoryRecord>> {
        let inner = self.read()?;
        // Append order is creation order; no re-sort needed
        Ok(inner
            .history
            .iter()
            .filter(|h| &h.document == document)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert_task(&self, task: ApprovalTask) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(format!(
                "task {} already exists",
                task.id
            )));
        }
        inner.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<ApprovalTask>> {
        Ok(self.read()?.tasks.get(id).cloned())
    }

    async fn tasks_for_document(&self, document: &DocumentId) -> StoreResult<Vec<ApprovalTask>> {
        let inner = self.read()?;
        let mut tasks: Vec<ApprovalTask> = inner
            .tasks
            .values()
            .filter(|t| &t.document == document)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn pending_tasks_assigned(
        &self,
        user: &UserId,
        roles: &[RoleId],
    ) -> StoreResult<Vec<ApprovalTask>> {
        let inner = self.read()?;
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending && t.is_assigned_to(user, roles))
            .cloned()
            .collect())
    }

    async fn resolve_task(&self, resolution: TaskResolution) -> StoreResult<()> {
        let mut inner = self.write()?;

        // Optimistic-concurrency gate: the first writer flips the task to
        // completed, every later writer is rejected here with nothing
        // applied.
        let task = inner
            .tasks
            .get(&resolution.task)
            .ok_or_else(|| StoreError::NotFound(format!("task {} not found", resolution.task)))?;
        if task.status != TaskStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "approval task is already {}",
                task.status
            )));
        }

        let document = inner.documents.get_mut(&resolution.document).ok_or_else(|| {
            StoreError::NotFound(format!("document {} not found", resolution.document))
        })?;
        document.current_state = resolution.new_state.clone();
        document.updated_at = resolution.completed_at;

        inner.history.push(resolution.history.clone());

        let task = inner
            .tasks
            .get_mut(&resolution.task)
            .ok_or_else(|| StoreError::NotFound(format!("task {} not found", resolution.task)))?;
        task.status = TaskStatus::Completed;
        task.completed_by = Some(resolution.completed_by.clone());
        task.completed_at = Some(resolution.completed_at);
        task.action_taken = Some(resolution.action_taken.clone());
        task.comment = resolution.comment.clone();

        for sibling in inner.tasks.values_mut() {
            if sibling.id != resolution.task
                && sibling.document == resolution.document
                && sibling.node == resolution.node
                && sibling.status == TaskStatus::Pending
            {
                sibling.status = TaskStatus::Cancelled;
            }
        }

        tracing::debug!(task_id = %resolution.task, to_state = %resolution.new_state,
            "task resolution committed");
        Ok(())
    }
}

#[async_trait]
impl Directory for InMemoryStore {
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn get_role(&self, id: &RoleId) -> StoreResult<Option<Role>> {
        Ok(self.read()?.roles.get(id).cloned())
    }

    async fn roles_of(&self, user: &UserId) -> StoreResult<Vec<RoleId>> {
        Ok(self
            .read()?
            .user_roles
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}
