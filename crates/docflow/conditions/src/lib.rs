//! Condition Evaluator for Docflow
//!
//! Pure, side-effect-free boolean evaluation over a document's data record.
//! Conditions gate visibility and workflow branching, so the evaluator is
//! defined to fail safe: malformed operands degrade to `false` (or `0`
//! inside a sum), never to an error. A throwing evaluator would be
//! indistinguishable from "satisfied" in a careless call site.
//!
//! Two layers:
//!
//! - [`compare`] — a single comparison between two JSON values under a
//!   [`CompareOp`], with numeric coercion for ordering operators and text
//!   coercion for substring operators.
//! - [`evaluate_condition`] / [`evaluate_conditions`] — a [`Condition`]
//!   addressing a scalar field or a repeated sub-record section with an
//!   [`ArrayMode`] aggregate (any/all/none/count/sum).

#![deny(unsafe_code)]

mod compare;
mod condition;
mod visibility;

pub use compare::*;
pub use condition::*;
pub use visibility::*;

/// Free-form JSON record a condition is evaluated against.
pub type DataMap = serde_json::Map<String, serde_json::Value>;
