//! Visibility rules: state membership plus data conditions
//!
//! Child forms and fields can be shown only in certain workflow states
//! and only when the document data satisfies a condition list.

use crate::{evaluate_conditions, Condition, ConditionLogic, DataMap};
use serde::{Deserialize, Serialize};

/// A visibility rule for a child form or field
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityRule {
    /// States in which the subject is visible; empty means every state
    pub visible_in_states: Vec<String>,
    /// Data conditions that must also hold
    pub conditions: Vec<Condition>,
    /// How the conditions combine
    pub logic: ConditionLogic,
}

impl VisibilityRule {
    /// Evaluate the rule for a document in `current_state` with `data`
    pub fn is_visible(&self, current_state: &str, data: &DataMap) -> bool {
        if !self.visible_in_states.is_empty()
            && !self.visible_in_states.iter().any(|s| s == current_state)
        {
            return false;
        }
        evaluate_conditions(&self.conditions, data, self.logic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompareOp;
    use serde_json::json;

    fn record() -> DataMap {
        match json!({"cargoType": "CBRM"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_state_gate() {
        let rule = VisibilityRule {
            visible_in_states: vec!["APPROVED".into()],
            ..Default::default()
        };
        assert!(rule.is_visible("APPROVED", &record()));
        assert!(!rule.is_visible("DRAFT", &record()));
    }

    #[test]
    fn test_empty_rule_is_visible_everywhere() {
        let rule = VisibilityRule::default();
        assert!(rule.is_visible("ANY_STATE", &record()));
    }

    #[test]
    fn test_conditions_also_gate() {
        let rule = VisibilityRule {
            visible_in_states: vec!["APPROVED".into()],
            conditions: vec![Condition::new("cargoType", CompareOp::Eq, json!("BULK"))],
            logic: ConditionLogic::And,
        };
        assert!(!rule.is_visible("APPROVED", &record()));
    }
}
