//! Condition evaluation against a document data record
//!
//! A condition addresses either a scalar field or a repeated sub-record
//! section. The section comes from dotted-path notation
//! (`"bollards.qty"`) or an explicit `sectionKey`; without an `arrayMode`
//! the condition stays a scalar lookup.

use crate::{compare, CompareOp, DataMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate semantics over a repeated sub-record section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMode {
    /// Some row satisfies the comparison
    Any,
    /// Every row satisfies it, and the section is non-empty
    All,
    /// No row satisfies it (vacuously true when empty)
    None,
    /// The row count satisfies the comparison
    Count,
    /// The numeric sum of the field satisfies the comparison
    Sum,
}

/// Combination logic for a condition list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLogic {
    #[default]
    And,
    Or,
}

/// A single boolean condition over document data
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    /// Field path: a plain key, or `section.field` for repeated sections
    pub field: String,
    /// Comparison operator
    pub operator: CompareOp,
    /// Comparison value
    pub value: Value,
    /// Explicit section key; an alternative to dotted-path notation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_key: Option<String>,
    /// Aggregate mode; absent means a scalar lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_mode: Option<ArrayMode>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: CompareOp, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            section_key: None,
            array_mode: None,
        }
    }

    pub fn with_section(mut self, section_key: impl Into<String>) -> Self {
        self.section_key = Some(section_key.into());
        self
    }

    pub fn with_array_mode(mut self, mode: ArrayMode) -> Self {
        self.array_mode = Some(mode);
        self
    }
}

/// Evaluate one condition against a data record. Never fails.
pub fn evaluate_condition(condition: &Condition, data: &DataMap) -> bool {
    let (section_key, field_key) = match condition.field.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (
            condition
                .section_key
                .as_deref()
                .filter(|s| !s.is_empty()),
            condition.field.as_str(),
        ),
    };

    let (Some(section_key), Some(mode)) = (section_key, condition.array_mode) else {
        // Scalar lookup; a missing field compares as null
        let field_value = data.get(field_key).unwrap_or(&Value::Null);
        return compare(field_value, condition.operator, &condition.value);
    };

    let Some(Value::Array(rows)) = data.get(section_key) else {
        return false;
    };

    let row_value = |row: &Value| match row {
        Value::Object(fields) => fields.get(field_key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    };

    match mode {
        ArrayMode::Any => rows
            .iter()
            .any(|row| compare(&row_value(row), condition.operator, &condition.value)),
        ArrayMode::All => {
            // An empty section never satisfies `all`; vacuous approval of an
            // empty repeatable section is worse than a false negative
            !rows.is_empty()
                && rows
                    .iter()
                    .all(|row| compare(&row_value(row), condition.operator, &condition.value))
        }
        ArrayMode::None => !rows
            .iter()
            .any(|row| compare(&row_value(row), condition.operator, &condition.value)),
        ArrayMode::Count => compare(
            &Value::from(rows.len() as u64),
            condition.operator,
            &condition.value,
        ),
        ArrayMode::Sum => {
            let total: f64 = rows
                .iter()
                .map(|row| crate::compare::as_number(&row_value(row)).unwrap_or(0.0))
                .sum();
            compare(&Value::from(total), condition.operator, &condition.value)
        }
    }
}

/// Evaluate a condition list under `and`/`or` logic. An empty list is
/// vacuously true.
pub fn evaluate_conditions(conditions: &[Condition], data: &DataMap, logic: ConditionLogic) -> bool {
    if conditions.is_empty() {
        return true;
    }
    match logic {
        ConditionLogic::And => conditions.iter().all(|c| evaluate_condition(c, data)),
        ConditionLogic::Or => conditions.iter().any(|c| evaluate_condition(c, data)),
    }
}
