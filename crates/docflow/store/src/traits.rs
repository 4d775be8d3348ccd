use crate::model::TaskResolution;
use crate::StoreResult;
use async_trait::async_trait;
use docflow_types::{
    ApprovalTask, Document, DocumentId, DocumentTypeId, GraphId, Node, NodeId, Role, RoleId,
    StateHistoryRecord, TaskId, User, UserId, WorkflowGraph,
};

/// Storage interface for workflow graphs.
///
/// Graphs are authored elsewhere and read-only to the engine; the write
/// methods here exist for the authoring layer and for tests.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert or replace a graph after structural validation.
    async fn put_graph(&self, graph: WorkflowGraph) -> StoreResult<()>;

    /// Get one graph by id.
    async fn get_graph(&self, id: &GraphId) -> StoreResult<Option<WorkflowGraph>>;

    /// The active graph for a document type. When several are active the
    /// most recently created wins; resolving that ambiguity properly is
    /// the authoring layer's concern.
    async fn active_graph_for(
        &self,
        document_type: &DocumentTypeId,
    ) -> StoreResult<Option<WorkflowGraph>>;

    /// The graph that owns a node.
    async fn graph_containing(&self, node: &NodeId) -> StoreResult<Option<WorkflowGraph>>;

    /// Look up a single node by id across all graphs.
    async fn get_node(&self, id: &NodeId) -> StoreResult<Option<Node>>;

    /// Remove a node and its connections. Refuses with
    /// [`crate::StoreError::Conflict`] while a pending approval task
    /// references the node.
    async fn remove_node(&self, graph: &GraphId, node: &NodeId) -> StoreResult<()>;
}

/// Storage interface for documents and their state history.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document.
    async fn put_document(&self, document: Document) -> StoreResult<()>;

    /// Get one document by id.
    async fn get_document(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// A document's state history, oldest first.
    async fn history_for_document(
        &self,
        document: &DocumentId,
    ) -> StoreResult<Vec<StateHistoryRecord>>;
}

/// Storage interface for approval tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a newly created task.
    async fn insert_task(&self, task: ApprovalTask) -> StoreResult<()>;

    /// Get one task by id.
    async fn get_task(&self, id: &TaskId) -> StoreResult<Option<ApprovalTask>>;

    /// All tasks recorded against a document, any status, newest first.
    async fn tasks_for_document(&self, document: &DocumentId) -> StoreResult<Vec<ApprovalTask>>;

    /// Pending tasks assigned to a user directly or through any of the
    /// given roles. Each task appears once.
    async fn pending_tasks_assigned(
        &self,
        user: &UserId,
        roles: &[RoleId],
    ) -> StoreResult<Vec<ApprovalTask>>;

    /// Atomically apply a task resolution: complete the winning task,
    /// write the document's new state, append the history record, and
    /// cancel sibling pending tasks — all or nothing, rejected with
    /// [`crate::StoreError::Conflict`] if the task is no longer pending.
    async fn resolve_task(&self, resolution: TaskResolution) -> StoreResult<()>;
}

/// A user/role directory resolvable by identifier.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Get one user by id.
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Get one role by id.
    async fn get_role(&self, id: &RoleId) -> StoreResult<Option<Role>>;

    /// The roles a user holds.
    async fn roles_of(&self, user: &UserId) -> StoreResult<Vec<RoleId>>;
}

/// Unified store bundle consumed by the workflow engine.
pub trait EngineStore: GraphStore + DocumentStore + TaskStore + Directory + Send + Sync {}

impl<T> EngineStore for T where T: GraphStore + DocumentStore + TaskStore + Directory + Send + Sync {}
