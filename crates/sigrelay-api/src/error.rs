//! API error types.
//!
//! Every failure response is `{"error": <stable name>, "details": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sigrelay_signal::SignalError;
use sigrelay_store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Failed to bind {address}: {reason}")]
    Bind { address: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if e.is_validation() {
            Self::Validation(e.to_string())
        } else {
            Self::Persistence(e.to_string())
        }
    }
}

impl From<SignalError> for ApiError {
    fn from(e: SignalError) -> Self {
        match e {
            SignalError::InvalidBody(reason) => Self::Validation(reason),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match self {
            ApiError::Validation(details) => (StatusCode::BAD_REQUEST, "ValidationError", details),
            ApiError::Persistence(details) => {
                error!(%details, "Request failed on store access");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PersistenceError",
                    details,
                )
            }
            other => {
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    other.to_string(),
                )
            }
        };

        (status, Json(json!({"error": code, "details": details}))).into_response()
    }
}
