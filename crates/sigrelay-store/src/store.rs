//! Record store trait.
//!
//! Abstracts persistence so that the ingestion adapter, the signal validator
//! and the HTTP handlers can be exercised against `MemoryStore` in tests and
//! `PgStore` in production.

use std::sync::Arc;

use sigrelay_core::{BoxFuture, Message, NewMessage, NewTradeSignal, PageRequest, TradeSignal};

use crate::error::StoreResult;

/// Append-only storage for messages and trade signals.
///
/// Every listing is ordered by creation time descending with ties broken by
/// identifier descending. Records are never updated or deleted.
pub trait RecordStore: Send + Sync {
    /// Insert a message; the store assigns `id` and `createdAt`.
    fn create_message(&self, message: NewMessage) -> BoxFuture<'_, StoreResult<Message>>;

    /// Insert a batch of messages in one transaction: either every message
    /// is stored or none is.
    fn create_messages(
        &self,
        messages: Vec<NewMessage>,
    ) -> BoxFuture<'_, StoreResult<Vec<Message>>>;

    /// Insert a trade signal; the store assigns `id` and `createdAt`.
    fn create_trade_signal(
        &self,
        signal: NewTradeSignal,
    ) -> BoxFuture<'_, StoreResult<TradeSignal>>;

    /// One page of messages plus the total message count.
    fn list_messages(&self, page: PageRequest) -> BoxFuture<'_, StoreResult<(Vec<Message>, u64)>>;

    /// Text column of the newest `limit` messages.
    fn list_message_texts(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<String>>>;

    /// The newest `limit` trade signals.
    fn list_trade_signals(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<TradeSignal>>>;

    /// Probe that both tables exist and are queryable.
    fn verify_schema(&self) -> BoxFuture<'_, StoreResult<()>>;

    /// Release connections. Later calls fail with `StoreError::Unavailable`.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Arc wrapper for RecordStore trait objects.
pub type DynRecordStore = Arc<dyn RecordStore>;
