//! Batch input and result types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sigrelay_core::TradeSignal;

use crate::error::{ItemError, SignalError, SignalResult};

/// Split a request body into submissions.
///
/// An object is a batch of one; an array must be non-empty. Anything else
/// is rejected before any item is looked at.
pub fn parse_submissions(body: Value) -> SignalResult<Vec<Value>> {
    match body {
        Value::Object(_) => Ok(vec![body]),
        Value::Array(items) if !items.is_empty() => Ok(items),
        Value::Array(_) => Err(SignalError::InvalidBody(
            "expected at least one submission".to_string(),
        )),
        other => Err(SignalError::InvalidBody(format!(
            "expected an object or an array of objects, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A rejected submission and its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    #[serde(flatten)]
    pub error: ItemError,
    pub details: String,
}

impl ItemFailure {
    pub fn new(index: usize, error: ItemError) -> Self {
        let details = error.to_string();
        Self {
            index,
            error,
            details,
        }
    }
}

/// `{total, errors, timestamp}` where `total` counts created signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub errors: usize,
    pub timestamp: DateTime<Utc>,
}

/// Result of submitting a batch.
///
/// `created.len() + errors.len()` equals the number of submissions, and
/// errors are in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub created: Vec<TradeSignal>,
    pub errors: Vec<ItemFailure>,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.created.len(),
            errors: self.errors.len(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_is_batch_of_one() {
        let items = parse_submissions(json!({"symbol": "BTC"})).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_array_kept_in_order() {
        let items = parse_submissions(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(items[1]["a"], 2);
    }

    #[test]
    fn test_bad_bodies_rejected() {
        for body in [json!([]), json!("text"), json!(null), json!(5)] {
            assert!(parse_submissions(body.clone()).is_err(), "{body}");
        }
    }

    #[test]
    fn test_failure_serialization() {
        let failure = ItemFailure::new(
            2,
            ItemError::InvalidNumber {
                field: "sl",
                value: json!("abc"),
            },
        );
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["index"], 2);
        assert_eq!(value["error"], "InvalidNumberError");
        assert_eq!(value["field"], "sl");
        assert_eq!(value["value"], "abc");
        assert_eq!(
            value["details"],
            "field sl is not a finite number: \"abc\""
        );
    }
}
