//! Signal validation error types.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Request-level failure: the body cannot be read as submissions at all.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

pub type SignalResult<T> = Result<T, SignalError>;

/// Why one submission in a batch was not stored.
///
/// Serialized with an `error` tag carrying the stable error name.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error")]
pub enum ItemError {
    #[serde(rename = "MissingFieldsError")]
    #[error("missing required fields: {}", .required.join(", "))]
    MissingFields {
        required: Vec<&'static str>,
        item: Value,
    },

    #[serde(rename = "InvalidTypeError")]
    #[error("invalid type {received}, expected one of {}", .allowed.join(", "))]
    InvalidType {
        allowed: Vec<&'static str>,
        received: Value,
    },

    #[serde(rename = "InvalidNumberError")]
    #[error("field {field} is not a finite number: {value}")]
    InvalidNumber { field: &'static str, value: Value },

    /// Finite, but too large for the stored decimal column.
    #[serde(rename = "NumberOutOfRangeError")]
    #[error("field {field} is outside the storable range: {value}")]
    NumberOutOfRange { field: &'static str, value: Value },

    /// The signal may already be stored when the derived message write
    /// failed; `signal_id` is set in that case.
    #[serde(rename = "PersistenceError")]
    #[error("failed to persist signal: {message}")]
    Persistence {
        message: String,
        item: Value,
        #[serde(rename = "signalId", skip_serializing_if = "Option::is_none")]
        signal_id: Option<i64>,
    },
}

impl ItemError {
    /// Stable error name, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingFields { .. } => "MissingFieldsError",
            Self::InvalidType { .. } => "InvalidTypeError",
            Self::InvalidNumber { .. } => "InvalidNumberError",
            Self::NumberOutOfRange { .. } => "NumberOutOfRangeError",
            Self::Persistence { .. } => "PersistenceError",
        }
    }
}
