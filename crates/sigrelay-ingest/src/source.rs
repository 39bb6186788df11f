//! Event source abstraction.
//!
//! Separates the ingestion loop from the chat transport so the adapter can
//! be driven by `MockEventSource` in tests and `TelegramPoller` in
//! production.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sigrelay_core::BoxFuture;

use crate::client::TelegramClient;
use crate::error::{IngestError, IngestResult};
use crate::message::{ChatEvent, Update};

/// Source of inbound chat events.
pub trait EventSource: Send + Sync {
    /// Verify credentials and reachability. Returns a label identifying the
    /// connected account.
    fn probe(&self) -> BoxFuture<'_, IngestResult<String>>;

    /// Wait for the next batch of events. An empty batch is a normal
    /// long-poll timeout.
    fn next_batch(&self) -> BoxFuture<'_, IngestResult<Vec<ChatEvent>>>;
}

/// Arc wrapper for EventSource trait objects.
pub type DynEventSource = Arc<dyn EventSource>;

/// Long-polling `getUpdates` source.
///
/// The offset advances past every received update, including ones that do
/// not normalize into an event, so nothing is handed out twice.
pub struct TelegramPoller {
    client: TelegramClient,
    poll_timeout: Duration,
    offset: Mutex<Option<i64>>,
}

impl TelegramPoller {
    pub fn new(client: TelegramClient, poll_timeout: Duration) -> Self {
        Self {
            client,
            poll_timeout,
            offset: Mutex::new(None),
        }
    }

    /// Next update id to request.
    pub fn offset(&self) -> Option<i64> {
        *self.offset.lock()
    }

    async fn poll(&self) -> IngestResult<Vec<ChatEvent>> {
        let offset = self.offset();
        let updates = self.client.get_updates(offset, self.poll_timeout).await?;
        Ok(self.accept(updates))
    }

    fn accept(&self, updates: Vec<Update>) -> Vec<ChatEvent> {
        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            let mut offset = self.offset.lock();
            let next = max_id + 1;
            if offset.map_or(true, |current| next > current) {
                *offset = Some(next);
            }
        }
        updates.into_iter().filter_map(Update::into_event).collect()
    }
}

impl EventSource for TelegramPoller {
    fn probe(&self) -> BoxFuture<'_, IngestResult<String>> {
        Box::pin(async move {
            let me = self.client.get_me().await?;
            Ok(me.username.unwrap_or_else(|| me.id.to_string()))
        })
    }

    fn next_batch(&self) -> BoxFuture<'_, IngestResult<Vec<ChatEvent>>> {
        Box::pin(self.poll())
    }
}

/// Scripted event source for testing.
///
/// Batches are returned in the order they were pushed. Once the script is
/// exhausted `next_batch` idles briefly and returns an empty batch, like a
/// long poll with no traffic.
#[derive(Debug)]
pub struct MockEventSource {
    batches: Mutex<VecDeque<IngestResult<Vec<ChatEvent>>>>,
    /// Number of probes that fail before one succeeds.
    probe_failures: AtomicU32,
    probe_calls: AtomicU32,
    idle: Duration,
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventSource {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(VecDeque::new()),
            probe_failures: AtomicU32::new(0),
            probe_calls: AtomicU32::new(0),
            idle: Duration::from_millis(10),
        }
    }

    /// Queue a batch of events.
    pub fn push_batch(&self, events: Vec<ChatEvent>) {
        self.batches.lock().push_back(Ok(events));
    }

    /// Queue a transport error.
    pub fn push_error(&self, reason: impl Into<String>) {
        self.batches
            .lock()
            .push_back(Err(IngestError::Transport(reason.into())));
    }

    /// Make the next `count` probes fail.
    pub fn fail_probes(&self, count: u32) {
        self.probe_failures.store(count, Ordering::SeqCst);
    }

    pub fn probe_calls(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Batches not yet consumed.
    pub fn pending(&self) -> usize {
        self.batches.lock().len()
    }
}

impl EventSource for MockEventSource {
    fn probe(&self) -> BoxFuture<'_, IngestResult<String>> {
        Box::pin(async move {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .probe_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(IngestError::Transport("mock probe failure".to_string()));
            }
            Ok("mock".to_string())
        })
    }

    fn next_batch(&self) -> BoxFuture<'_, IngestResult<Vec<ChatEvent>>> {
        Box::pin(async move {
            let next = self.batches.lock().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    tokio::time::sleep(self.idle).await;
                    Ok(Vec::new())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Chat, ChatMessage, EventKind};

    fn update(id: i64, text: Option<&str>) -> Update {
        Update {
            update_id: id,
            message: Some(ChatMessage {
                message_id: id,
                chat: Chat {
                    id: 1,
                    chat_type: "private".to_string(),
                },
                from: None,
                text: text.map(str::to_string),
            }),
            channel_post: None,
        }
    }

    fn poller() -> TelegramPoller {
        let client =
            TelegramClient::new("http://127.0.0.1:1", "1:t", Duration::from_secs(1)).unwrap();
        TelegramPoller::new(client, Duration::from_secs(1))
    }

    #[test]
    fn test_offset_advances_past_every_update() {
        let poller = poller();
        assert_eq!(poller.offset(), None);

        let unsupported = Update {
            update_id: 9,
            message: None,
            channel_post: None,
        };
        let events = poller.accept(vec![update(7, Some("a")), unsupported]);
        assert_eq!(events.len(), 1);
        assert_eq!(poller.offset(), Some(10));

        // An empty poll keeps the offset.
        poller.accept(Vec::new());
        assert_eq!(poller.offset(), Some(10));
    }

    #[tokio::test]
    async fn test_mock_probe_failures_then_success() {
        let source = MockEventSource::new();
        source.fail_probes(2);
        assert!(source.probe().await.is_err());
        assert!(source.probe().await.is_err());
        assert_eq!(source.probe().await.unwrap(), "mock");
        assert_eq!(source.probe_calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_batches_in_order() {
        let source = MockEventSource::new();
        source.push_batch(vec![ChatEvent::text(EventKind::Message, "1", "first")]);
        source.push_error("boom");

        let first = source.next_batch().await.unwrap();
        assert_eq!(first[0].text.as_deref(), Some("first"));
        assert!(source.next_batch().await.is_err());
        assert!(source.next_batch().await.unwrap().is_empty());
        assert_eq!(source.pending(), 0);
    }
}
