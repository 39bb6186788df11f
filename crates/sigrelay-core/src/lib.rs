//! Domain types for the sigrelay message and trade-signal relay.
//!
//! This crate provides the types shared by every other crate:
//! - `Message`, `NewMessage`: append-only chat/text records
//! - `TradeSignal`, `NewTradeSignal`, `SignalType`: trading instructions
//! - `Price`: finite decimal price parsed from loose JSON input
//! - `PageRequest`, `Pagination`: offset/limit paging contract

pub mod error;
pub mod message;
pub mod page;
pub mod price;
pub mod signal;

pub use error::{CoreError, Result};
pub use message::{Message, NewMessage};
pub use page::{PageRequest, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use price::Price;
pub use signal::{NewTradeSignal, SignalType, TradeSignal};

use std::future::Future;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
