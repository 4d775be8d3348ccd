//! Permission evaluation: state-scoped view/edit checks
//!
//! Every answer is fail-closed. A missing graph, a state with no
//! configuring node, or any store fault yields "not permitted" — an
//! authorization check must never surface an error a careless caller
//! could catch-and-ignore into an implicit grant.

use crate::EngineResult;
use docflow_store::EngineStore;
use docflow_types::{DocumentId, RoleId, StatePermissions, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The permission being asked about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    /// May the user see the document at all
    View,
    /// May the user edit the main form
    EditMainForm,
    /// May the user edit child forms
    EditChildForms,
}

/// Answers view/edit queries for a user against a document's current state
pub struct PermissionEvaluator<S> {
    store: Arc<S>,
}

impl<S: EngineStore> PermissionEvaluator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check a permission for a user against a document's current state.
    ///
    /// Never fails: internal faults are logged and degrade to `false`.
    pub async fn check_permission(
        &self,
        document: &DocumentId,
        user: &UserId,
        kind: PermissionKind,
    ) -> bool {
        match self.evaluate(document, user, kind).await {
            Ok(granted) => granted,
            Err(error) => {
                tracing::warn!(
                    document = %document,
                    user = %user,
                    %error,
                    "permission check failed; denying"
                );
                false
            }
        }
    }

    async fn evaluate(
        &self,
        document_id: &DocumentId,
        user: &UserId,
        kind: PermissionKind,
    ) -> EngineResult<bool> {
        let Some(document) = self.store.get_document(document_id).await? else {
            return Ok(false);
        };
        let Some(graph) = self.store.active_graph_for(&document.document_type).await? else {
            return Ok(false);
        };
        let Some(state_node) = graph.find_state_node(&document.current_state) else {
            return Ok(false);
        };

        let permissions = state_node
            .state
            .as_ref()
            .and_then(|config| config.permissions.clone())
            .unwrap_or_default();

        match kind {
            PermissionKind::View => self.evaluate_view(&document, user, &permissions).await,
            PermissionKind::EditMainForm => Ok(self.evaluate_edit(
                permissions.edit_main_form,
                &permissions.edit_main_form_roles,
                &permissions.edit_main_form_users,
                user,
                &self.store.roles_of(user).await?,
            )),
            PermissionKind::EditChildForms => Ok(self.evaluate_edit(
                permissions.edit_child_forms,
                &permissions.edit_child_forms_roles,
                &permissions.edit_child_forms_users,
                user,
                &self.store.roles_of(user).await?,
            )),
        }
    }

    async fn evaluate_view(
        &self,
        document: &docflow_types::Document,
        user: &UserId,
        permissions: &StatePermissions,
    ) -> EngineResult<bool> {
        let view = &permissions.view;

        if view.include_submitter && document.submitted_by.as_ref() == Some(user) {
            return Ok(true);
        }

        if view.include_approvers {
            // Any approval task recorded against the document counts,
            // pending or not
            let roles = self.store.roles_of(user).await?;
            let tasks = self.store.tasks_for_document(&document.id).await?;
            if tasks.iter().any(|task| task.is_assigned_to(user, &roles)) {
                return Ok(true);
            }
        }

        if !view.users.is_empty() && view.users.contains(user) {
            return Ok(true);
        }
        if !view.roles.is_empty() {
            let roles = self.store.roles_of(user).await?;
            if roles.iter().any(|role| view.roles.contains(role)) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn evaluate_edit(
        &self,
        enabled: bool,
        allowed_roles: &[RoleId],
        allowed_users: &[UserId],
        user: &UserId,
        held_roles: &[RoleId],
    ) -> bool {
        if !enabled {
            return false;
        }
        // Each non-empty allow-list is independently restrictive
        if !allowed_roles.is_empty() && !held_roles.iter().any(|r| allowed_roles.contains(r)) {
            return false;
        }
        if !allowed_users.is_empty() && !allowed_users.contains(user) {
            return false;
        }
        true
    }
}
