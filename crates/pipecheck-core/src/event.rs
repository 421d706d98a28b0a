//! Event model shared by the loader, the comparison engine and the executor.
//!
//! An [`Event`] is one structured record emitted by the pipeline under test,
//! i.e. basically a JSON document. Field order carries no meaning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structured output record emitted by the pipeline: a mapping from
/// field names to arbitrary JSON-shaped values.
pub type Event = serde_json::Map<String, Value>;

/// The outcome of one pipeline execution, produced by an
/// [`executor`](crate::executor) and consumed read-only by the comparison
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether the pipeline process terminated with a zero exit status.
    pub success: bool,
    /// The events emitted by the pipeline, in emission order.
    pub events: Vec<Event>,
    /// The pipeline's log output (stderr), captured verbatim.
    pub log: String,
}

/// Deep structural equality between two events: same set of field names and,
/// for every field, [`values_equal`] on the values.
pub fn events_equal(a: &Event, b: &Event) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
}

/// Recursive value equality with numeric normalization.
///
/// JSON as a source format does not distinguish `1` from `1.0`, so numbers
/// compare by value rather than representation: two integral numbers compare
/// exactly (large u64s are not squeezed through f64), everything else
/// compares as f64. Maps compare by key and value, sequences by length and
/// position, remaining scalars by value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| values_equal(v, w))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
