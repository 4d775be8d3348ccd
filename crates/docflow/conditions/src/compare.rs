//! Scalar comparison between two JSON values

use serde_json::Value;

/// Comparison operator between a field value and a condition value
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "starts_with")]
    StartsWith,
    #[serde(rename = "ends_with")]
    EndsWith,
}

impl Default for CompareOp {
    fn default() -> Self {
        Self::Eq
    }
}

/// Numeric coercion: numbers, numeric strings, and booleans coerce; all
/// other values do not.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Text coercion used by the substring operators.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Equality that compares two numbers numerically (`1` equals `1.0`) and
/// everything else structurally.
fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        return match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        };
    }
    left == right
}

/// Membership of `left` in `right`: sequence containment for arrays,
/// substring for a pair of strings, undefined (`None`) otherwise.
fn membership(left: &Value, right: &Value) -> Option<bool> {
    match right {
        Value::Array(items) => Some(items.iter().any(|item| values_equal(left, item))),
        Value::String(haystack) => match left {
            Value::String(needle) => Some(haystack.contains(needle.as_str())),
            _ => None,
        },
        _ => None,
    }
}

/// Evaluate one comparison. Never fails: a coercion that does not apply
/// yields `false`.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => match op {
                    CompareOp::Lt => l < r,
                    CompareOp::Le => l <= r,
                    CompareOp::Gt => l > r,
                    CompareOp::Ge => l >= r,
                    _ => unreachable!(),
                },
                _ => false,
            }
        }
        CompareOp::In => membership(left, right).unwrap_or(false),
        CompareOp::NotIn => membership(left, right).map(|m| !m).unwrap_or(false),
        CompareOp::Contains => as_text(left).contains(&as_text(right)),
        CompareOp::StartsWith => as_text(left).starts_with(&as_text(right)),
        CompareOp::EndsWith => as_text(left).ends_with(&as_text(right)),
    }
}
