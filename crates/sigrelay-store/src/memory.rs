//! In-process record store.
//!
//! Keeps rows in vectors behind a `parking_lot::Mutex`. Used by tests across
//! the workspace and for running the service without a database. Failure
//! switches let tests simulate a broken backend.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use sigrelay_core::{BoxFuture, Message, NewMessage, NewTradeSignal, PageRequest, TradeSignal};

use crate::error::{StoreError, StoreResult};
use crate::store::RecordStore;

#[derive(Default)]
struct Tables {
    messages: Vec<Message>,
    signals: Vec<TradeSignal>,
    next_message_id: i64,
    next_signal_id: i64,
}

/// Record store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_message_writes: AtomicBool,
    /// Message inserts left before writes start failing.
    message_write_budget: Mutex<Option<u32>>,
    fail_signal_writes: AtomicBool,
    fail_reads: AtomicBool,
    schema_missing: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent message insert fail.
    pub fn set_fail_message_writes(&self, fail: bool) {
        self.fail_message_writes.store(fail, Ordering::SeqCst);
    }

    /// Allow `count` more message inserts, then fail every one after.
    pub fn fail_message_writes_after(&self, count: u32) {
        *self.message_write_budget.lock() = Some(count);
    }

    /// Make every subsequent trade signal insert fail.
    pub fn set_fail_signal_writes(&self, fail: bool) {
        self.fail_signal_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent listing fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `verify_schema` report a missing table.
    pub fn set_schema_missing(&self, missing: bool) {
        self.schema_missing.store(missing, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// All stored messages in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().messages.clone()
    }

    /// All stored signals in insertion order.
    pub fn signals(&self) -> Vec<TradeSignal> {
        self.tables.lock().signals.clone()
    }

    fn check(&self, failing: &AtomicBool, what: &str) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Unavailable("store closed".to_string()));
        }
        if failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{what} failed")));
        }
        Ok(())
    }

    fn check_message_write(&self) -> StoreResult<()> {
        self.check(&self.fail_message_writes, "message insert")?;
        let mut budget = self.message_write_budget.lock();
        match budget.as_mut() {
            Some(0) => Err(StoreError::Unavailable("message insert failed".to_string())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn insert_message(&self, message: NewMessage) -> StoreResult<Message> {
        self.insert_messages(vec![message])?
            .pop()
            .ok_or_else(|| StoreError::Unavailable("message insert returned no row".to_string()))
    }

    /// Stage every row first so a failure leaves the table untouched.
    fn insert_messages(&self, messages: Vec<NewMessage>) -> StoreResult<Vec<Message>> {
        let mut tables = self.tables.lock();
        let mut next_id = tables.next_message_id;
        let mut staged = Vec::with_capacity(messages.len());

        for message in messages {
            self.check_message_write()?;
            next_id += 1;
            staged.push(Message {
                id: next_id,
                text: message.text().to_string(),
                user_id: message.user_id().map(str::to_string),
                chat_id: message.chat_id().map(str::to_string),
                created_at: Utc::now(),
            });
        }

        tables.next_message_id = next_id;
        tables.messages.extend(staged.iter().cloned());
        Ok(staged)
    }

    fn insert_signal(&self, signal: NewTradeSignal) -> StoreResult<TradeSignal> {
        self.check(&self.fail_signal_writes, "trade signal insert")?;
        let mut tables = self.tables.lock();
        tables.next_signal_id += 1;
        let stored = TradeSignal {
            id: tables.next_signal_id,
            symbol: signal.symbol().to_string(),
            signal_type: signal.signal_type(),
            entry: signal.entry(),
            sl: signal.sl(),
            tp: signal.tp(),
            text: signal.text().to_string(),
            created_at: Utc::now(),
        };
        tables.signals.push(stored.clone());
        Ok(stored)
    }

    fn newest_messages(&self) -> StoreResult<Vec<Message>> {
        self.check(&self.fail_reads, "message read")?;
        let mut messages = self.tables.lock().messages.clone();
        messages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(messages)
    }

    fn newest_signals(&self, limit: u32) -> StoreResult<Vec<TradeSignal>> {
        self.check(&self.fail_reads, "trade signal read")?;
        let mut signals = self.tables.lock().signals.clone();
        signals.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        signals.truncate(limit as usize);
        Ok(signals)
    }
}

impl RecordStore for MemoryStore {
    fn create_message(&self, message: NewMessage) -> BoxFuture<'_, StoreResult<Message>> {
        Box::pin(async move { self.insert_message(message) })
    }

    fn create_messages(
        &self,
        messages: Vec<NewMessage>,
    ) -> BoxFuture<'_, StoreResult<Vec<Message>>> {
        Box::pin(async move { self.insert_messages(messages) })
    }

    fn create_trade_signal(
        &self,
        signal: NewTradeSignal,
    ) -> BoxFuture<'_, StoreResult<TradeSignal>> {
        Box::pin(async move { self.insert_signal(signal) })
    }

    fn list_messages(&self, page: PageRequest) -> BoxFuture<'_, StoreResult<(Vec<Message>, u64)>> {
        Box::pin(async move {
            let all = self.newest_messages()?;
            let total = all.len() as u64;
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            let rows = all
                .into_iter()
                .skip(offset)
                .take(page.limit() as usize)
                .collect();
            Ok((rows, total))
        })
    }

    fn list_message_texts(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<String>>> {
        Box::pin(async move {
            Ok(self
                .newest_messages()?
                .into_iter()
                .take(limit as usize)
                .map(|m| m.text)
                .collect())
        })
    }

    fn list_trade_signals(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<TradeSignal>>> {
        Box::pin(async move { self.newest_signals(limit) })
    }

    fn verify_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            if self.schema_missing.load(Ordering::SeqCst) {
                return Err(StoreError::SchemaMissing {
                    table: "Message".to_string(),
                    reason: "relation does not exist".to_string(),
                });
            }
            self.check(&self.fail_reads, "schema probe")
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
        })
    }
}
