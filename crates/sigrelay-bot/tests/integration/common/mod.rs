//! Shared fixtures for application tests.

use std::time::Duration;

use parking_lot::Mutex;
use sigrelay_bot::{AppConfig, Lifecycle, LifecycleState};
use sigrelay_core::{
    BoxFuture, Message, NewMessage, NewTradeSignal, PageRequest, TradeSignal,
};
use sigrelay_store::{MemoryStore, RecordStore, StoreResult};
use tokio::time::timeout;

/// Config bound to an ephemeral loopback port with no startup delays.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.bind_address = "127.0.0.1".to_string();
    config.api.port = 0;
    config.telegram.target_id = Some("42".to_string());
    config.telegram.launch_backoff_secs = 0;
    config.telegram.retry_delay_secs = 0;
    config.shutdown.drain_timeout_secs = 5;
    config
}

/// Wait until the lifecycle reaches `state`.
pub async fn wait_for_state(lifecycle: &Lifecycle, state: LifecycleState) {
    let reached = timeout(Duration::from_secs(5), async {
        while lifecycle.state() != state {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "lifecycle stuck in {} waiting for {state}",
        lifecycle.state()
    );
}

/// Poll `check` until it holds.
pub async fn wait_until<F: Fn() -> bool>(check: F) {
    let reached = timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "condition not met within timeout");
}

/// How `ScriptedStore` misbehaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreScript {
    /// `close` never completes.
    pub hang_on_close: bool,
    /// `list_messages` panics.
    pub panic_on_list: bool,
}

/// `MemoryStore` wrapper that can stall or panic, and records whether the
/// HTTP listener still accepted connections when `close` ran.
pub struct ScriptedStore {
    inner: MemoryStore,
    script: StoreScript,
    watched_port: Mutex<Option<u16>>,
    listener_open_at_close: Mutex<Option<bool>>,
}

impl ScriptedStore {
    pub fn new(script: StoreScript) -> Self {
        Self {
            inner: MemoryStore::new(),
            script,
            watched_port: Mutex::new(None),
            listener_open_at_close: Mutex::new(None),
        }
    }

    /// Check `port` for a live listener when `close` is called.
    pub fn watch_port(&self, port: u16) {
        *self.watched_port.lock() = Some(port);
    }

    /// `Some(open)` once `close` has run with a watched port.
    pub fn listener_open_at_close(&self) -> Option<bool> {
        *self.listener_open_at_close.lock()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl RecordStore for ScriptedStore {
    fn create_message(&self, message: NewMessage) -> BoxFuture<'_, StoreResult<Message>> {
        self.inner.create_message(message)
    }

    fn create_messages(
        &self,
        messages: Vec<NewMessage>,
    ) -> BoxFuture<'_, StoreResult<Vec<Message>>> {
        self.inner.create_messages(messages)
    }

    fn create_trade_signal(
        &self,
        signal: NewTradeSignal,
    ) -> BoxFuture<'_, StoreResult<TradeSignal>> {
        self.inner.create_trade_signal(signal)
    }

    fn list_messages(&self, page: PageRequest) -> BoxFuture<'_, StoreResult<(Vec<Message>, u64)>> {
        if self.script.panic_on_list {
            panic!("list_messages blew up");
        }
        self.inner.list_messages(page)
    }

    fn list_message_texts(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<String>>> {
        self.inner.list_message_texts(limit)
    }

    fn list_trade_signals(&self, limit: u32) -> BoxFuture<'_, StoreResult<Vec<TradeSignal>>> {
        self.inner.list_trade_signals(limit)
    }

    fn verify_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.inner.verify_schema()
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let port = *self.watched_port.lock();
            if let Some(port) = port {
                let open = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok();
                *self.listener_open_at_close.lock() = Some(open);
            }
            if self.script.hang_on_close {
                std::future::pending::<()>().await;
            }
            self.inner.close().await;
        })
    }
}
