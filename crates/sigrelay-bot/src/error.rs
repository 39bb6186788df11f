//! Application error types.

use crate::lifecycle::LifecycleState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] sigrelay_store::StoreError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] sigrelay_ingest::IngestError),

    #[error("API error: {0}")]
    Api(#[from] sigrelay_api::ApiError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] sigrelay_telemetry::TelemetryError),

    #[error("Invalid lifecycle transition {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
