//! Trade signal batch validation for sigrelay.
//!
//! Validates one or many loosely-typed signal submissions independently,
//! persists the valid ones together with their derived message, and
//! reports per-item errors in input order.
//!
//! Per item, in order: presence, type, numbers (`entry`, `sl`, `tp`; first
//! failure wins), then persistence.

pub mod batch;
pub mod error;
pub mod validator;

pub use batch::{parse_submissions, BatchOutcome, BatchSummary, ItemFailure};
pub use error::{ItemError, SignalError, SignalResult};
pub use validator::{validate_item, SignalValidator, NUMERIC_FIELDS, REQUIRED_FIELDS};
