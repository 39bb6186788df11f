//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigrelay_core::{Message, NewMessage, Pagination, TradeSignal};
use sigrelay_signal::{BatchOutcome, BatchSummary, ItemFailure};

use crate::error::{ApiError, ApiResult};

/// `GET /` body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Raw paging parameters. Kept as strings so bad values fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Build from decoded query pairs. The first occurrence of a repeated
    /// key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        Self {
            page: first("page"),
            limit: first("limit"),
        }
    }
}

/// `GET /messages` body.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub data: Vec<Message>,
    pub pagination: Pagination,
}

/// `POST /trades` body.
#[derive(Debug, Clone, Serialize)]
pub struct TradeBatchResponse {
    pub data: Vec<TradeSignal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemFailure>,
    pub metadata: BatchSummary,
}

impl From<BatchOutcome> for TradeBatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let metadata = outcome.summary();
        Self {
            data: outcome.created,
            errors: outcome.errors,
            metadata,
        }
    }
}

/// Parsed `POST /messages` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSubmission {
    One(NewMessage),
    Many(Vec<NewMessage>),
}

impl MessageSubmission {
    /// Validate every item before anything is written.
    pub fn parse(body: Value) -> ApiResult<Self> {
        match body {
            Value::Object(_) => Ok(Self::One(message_item(&body, None)?)),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| message_item(item, Some(i)))
                .collect::<ApiResult<Vec<_>>>()
                .map(Self::Many),
            _ => Err(ApiError::Validation(
                "expected {text} or an array of {text}".to_string(),
            )),
        }
    }
}

fn message_item(item: &Value, index: Option<usize>) -> ApiResult<NewMessage> {
    let text = item
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty());
    match (text, index) {
        (Some(text), _) => NewMessage::new(text).map_err(|e| ApiError::Validation(e.to_string())),
        (None, Some(i)) => Err(ApiError::Validation(format!("text is required (item {i})"))),
        (None, None) => Err(ApiError::Validation("text is required".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_and_batch_message_bodies() {
        assert!(matches!(
            MessageSubmission::parse(json!({"text": "hi"})).unwrap(),
            MessageSubmission::One(_)
        ));
        match MessageSubmission::parse(json!([{"text": "a"}, {"text": "b"}])).unwrap() {
            MessageSubmission::Many(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Many, got {other:?}"),
        }
    }

    #[test]
    fn test_any_missing_text_rejects_whole_batch() {
        let err = MessageSubmission::parse(json!([{"text": "a"}, {"txt": "b"}])).unwrap_err();
        assert!(err.to_string().contains("item 1"));
        assert!(MessageSubmission::parse(json!({"text": ""})).is_err());
        assert!(MessageSubmission::parse(json!({"text": 5})).is_err());
        assert!(MessageSubmission::parse(json!("hi")).is_err());
    }

    #[test]
    fn test_repeated_page_keys_take_first() {
        let pairs = vec![
            ("page".to_string(), "2".to_string()),
            ("sort".to_string(), "asc".to_string()),
            ("page".to_string(), "9".to_string()),
            ("limit".to_string(), "5".to_string()),
        ];
        let params = PageParams::from_pairs(&pairs);
        assert_eq!(params.page.as_deref(), Some("2"));
        assert_eq!(params.limit.as_deref(), Some("5"));

        let empty = PageParams::from_pairs(&[]);
        assert!(empty.page.is_none() && empty.limit.is_none());
    }
}
