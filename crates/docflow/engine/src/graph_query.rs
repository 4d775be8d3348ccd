//! Graph queries: deriving approval actions from graph topology
//!
//! Every connection from an approval node to a `state` node becomes one
//! approval button. Connections to any other node kind are reserved for
//! future extension and ignored here.

use docflow_types::{ApprovalAction, NodeId, NodeKind, WorkflowGraph};

/// Derive the stable action key from a button label.
///
/// Surrounding whitespace is trimmed, the label lowercased, and interior
/// spaces replaced with underscores — so "Approve" and "approve " define
/// the same key. The derivation is idempotent: applying it to its own
/// output is a no-op. Two connections whose labels collide are silently
/// permitted; lookup takes the first match in derived order.
pub fn action_key(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Derive the ordered list of approval actions available at an approval
/// node.
///
/// Only connections targeting `state` nodes qualify. Actions sort
/// ascending by their configured `order`; ties keep connection creation
/// order (the sort is stable). Returns an empty list when no qualifying
/// connection exists.
pub fn derive_actions(graph: &WorkflowGraph, approval_node: &NodeId) -> Vec<ApprovalAction> {
    let mut actions: Vec<ApprovalAction> = graph
        .outgoing_connections(approval_node)
        .into_iter()
        .filter_map(|connection| {
            let target = graph.get_node(&connection.target)?;
            if target.kind != NodeKind::State {
                return None;
            }
            let config = connection.action.clone().unwrap_or_default();
            Some(ApprovalAction {
                connection_id: connection.id.clone(),
                key: action_key(&config.label),
                label: config.label,
                button_color: config.button_color,
                requires_comment: config.requires_comment,
                order: config.order,
                icon: config.icon,
                target_node_id: target.id.clone(),
                target_state: target.resolved_state_key().unwrap_or_default().to_string(),
            })
        })
        .collect();

    actions.sort_by_key(|a| a.order);
    actions
}
