//! Store error types.

use sigrelay_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema check failed for table {table}: {reason}")]
    SchemaMissing { table: String, reason: String },

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
