//! Ingestion error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Bot API error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Message parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Launch failed after {attempts} attempts: {reason}")]
    LaunchFailed { attempts: u32, reason: String },
}

pub type IngestResult<T> = Result<T, IngestError>;
