//! Error types for sigrelay-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Message text is required")]
    EmptyText,

    #[error("Symbol is required")]
    EmptySymbol,

    #[error("Invalid signal type: {0}")]
    InvalidSignalType(String),

    #[error("Not a finite number: {0}")]
    NotANumber(String),

    #[error("Number outside the storable range: {0}")]
    PriceOutOfRange(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
