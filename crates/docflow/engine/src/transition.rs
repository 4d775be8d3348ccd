//! Transition planning: the document state write plus its audit record
//!
//! A transition never commits on its own. This module computes what a
//! transition writes — the document's new current state and exactly one
//! history record — and the task lifecycle applies it inside the same
//! atomic unit as task completion and sibling cancellation.

use docflow_types::{DataMap, Document, Node, StateHistoryRecord, UserId};

/// A planned state transition, ready to be committed by the caller
#[derive(Clone, Debug)]
pub(crate) struct TransitionPlan {
    /// The document's new current state
    pub to_state: String,
    /// The audit record to append alongside the state write
    pub history: StateHistoryRecord,
}

/// Plan a transition of `document` to the state configured on
/// `target_node`.
///
/// `from_state` is captured from the document as-is — empty for a
/// document's first transition. The target state is the node's resolved
/// state key, falling back to its label, so a well-formed state node
/// cannot fail to resolve.
pub(crate) fn plan_transition(
    document: &Document,
    target_node: &Node,
    actor: &UserId,
    action_key: &str,
    action_label: &str,
    comment: &str,
    metadata: DataMap,
) -> TransitionPlan {
    let to_state = target_node
        .resolved_state_key()
        .unwrap_or(target_node.label.as_str())
        .to_string();

    let history = StateHistoryRecord::new(
        document.id.clone(),
        document.current_state.clone(),
        to_state.clone(),
    )
    .with_actor(actor.clone())
    .with_action(action_key, action_label)
    .with_comment(comment)
    .with_node(target_node.id.clone())
    .with_metadata(metadata);

    TransitionPlan { to_state, history }
}
