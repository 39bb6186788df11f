//! Ingestion adapter.
//!
//! Turns chat events into stored messages:
//! - Dispatch table from event kind to handler, built once from the capture mode
//! - Targeted capture: only the configured chat, text only
//! - Open capture: every chat, tagged with user and chat ids
//! - At-most-once: write failures and timeouts drop the event, the loop keeps going

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigrelay_core::NewMessage;
use sigrelay_store::DynRecordStore;
use sigrelay_telemetry::Metrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::message::{ChatEvent, EventKind};
use crate::source::EventSource;

/// Which chat events are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Only the configured target chat; text only.
    #[default]
    Targeted,
    /// Every chat; tagged with user and chat identifiers.
    Open,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Targeted => f.write_str("targeted"),
            Self::Open => f.write_str("open"),
        }
    }
}

impl FromStr for CaptureMode {
    type Err = IngestError;

    fn from_str(s: &str) -> IngestResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "targeted" => Ok(Self::Targeted),
            "open" => Ok(Self::Open),
            other => Err(IngestError::Configuration(format!(
                "unknown capture mode {other:?} (expected targeted|open)"
            ))),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub capture_mode: CaptureMode,
    /// Chat identifier accepted in targeted mode, compared as a string.
    pub target_id: Option<String>,
    /// Upper bound on handling one event.
    pub handler_timeout: Duration,
    /// Probe attempts at launch.
    pub probe_attempts: u32,
    /// Delay between launch probes.
    pub probe_backoff: Duration,
    /// Delay after a transport error before polling again.
    pub retry_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::Targeted,
            target_id: None,
            handler_timeout: Duration::from_secs(90),
            probe_attempts: 3,
            probe_backoff: Duration::from_secs(5),
            retry_delay: Duration::from_secs(3),
        }
    }
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Stored with this message id.
    Stored(i64),
    /// Filtered out; carries the discard reason label.
    Discarded(&'static str),
    /// Accepted but lost (write failure or timeout).
    Dropped(String),
}

enum Decision {
    Accept(NewMessage),
    Discard(&'static str),
}

/// Pure per-kind handler: decides whether and how an event is stored.
type EventHandler = fn(&IngestConfig, &ChatEvent) -> Decision;

fn capture_targeted(config: &IngestConfig, event: &ChatEvent) -> Decision {
    let Some(target) = config.target_id.as_deref() else {
        return Decision::Discard("no_target");
    };
    if event.chat_id != target {
        return Decision::Discard("other_chat");
    }
    match event.text.as_deref().map(NewMessage::new) {
        Some(Ok(message)) => Decision::Accept(message),
        _ => Decision::Discard("no_text"),
    }
}

fn capture_open(_config: &IngestConfig, event: &ChatEvent) -> Decision {
    let Some(text) = event.text.as_deref() else {
        return Decision::Discard("no_text");
    };
    match NewMessage::tagged(text, event.user_id.clone(), Some(event.chat_id.clone())) {
        Ok(message) => Decision::Accept(message),
        Err(_) => Decision::Discard("no_text"),
    }
}

/// Stores accepted chat events as messages.
pub struct IngestionAdapter {
    store: DynRecordStore,
    config: IngestConfig,
    handlers: HashMap<EventKind, EventHandler>,
}

impl IngestionAdapter {
    pub fn new(store: DynRecordStore, config: IngestConfig) -> Self {
        let handler: EventHandler = match config.capture_mode {
            CaptureMode::Targeted => capture_targeted,
            CaptureMode::Open => capture_open,
        };
        let handlers = EventKind::ALL.into_iter().map(|k| (k, handler)).collect();

        if config.capture_mode == CaptureMode::Targeted && config.target_id.is_none() {
            error!("Configuration error: TARGET_ID is not set, all chat events will be discarded");
        }

        Self {
            store,
            config,
            handlers,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Verify the transport, retrying up to `probe_attempts` times.
    pub async fn launch(&self, source: &dyn EventSource) -> IngestResult<String> {
        let attempts = self.config.probe_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match source.probe().await {
                Ok(identity) => {
                    info!(%identity, attempt, mode = %self.config.capture_mode, "Chat transport ready");
                    return Ok(identity);
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, error = %e, "Bot launch probe failed");
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.probe_backoff).await;
            }
        }

        Err(IngestError::LaunchFailed {
            attempts,
            reason: last_error,
        })
    }

    /// Handle one event. Never fails; the outcome is logged and counted.
    pub async fn handle_event(&self, event: &ChatEvent) -> IngestOutcome {
        let Some(handler) = self.handlers.get(&event.kind) else {
            return IngestOutcome::Discarded("unhandled");
        };

        let message = match handler(&self.config, event) {
            Decision::Accept(message) => message,
            Decision::Discard(reason) => {
                debug!(kind = %event.kind, chat_id = %event.chat_id, reason, "Chat event discarded");
                Metrics::event_discarded(reason);
                return IngestOutcome::Discarded(reason);
            }
        };

        let write = self.store.create_message(message);
        match tokio::time::timeout(self.config.handler_timeout, write).await {
            Ok(Ok(stored)) => {
                debug!(id = stored.id, kind = %event.kind, "Chat event stored");
                Metrics::message_ingested(event.kind.as_str());
                IngestOutcome::Stored(stored.id)
            }
            Ok(Err(e)) => {
                error!(kind = %event.kind, chat_id = %event.chat_id, error = %e, "Failed to store chat event");
                Metrics::ingest_write_failed();
                IngestOutcome::Dropped(e.to_string())
            }
            Err(_) => {
                warn!(
                    kind = %event.kind,
                    timeout_secs = self.config.handler_timeout.as_secs(),
                    "Chat event handling timed out"
                );
                Metrics::event_discarded("timeout");
                IngestOutcome::Dropped("handler timed out".to_string())
            }
        }
    }

    /// Poll `source` until `shutdown` is cancelled.
    pub async fn run(&self, source: &dyn EventSource, shutdown: CancellationToken) {
        info!(mode = %self.config.capture_mode, "Ingestion loop started");

        loop {
            let batch = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                batch = source.next_batch() => batch,
            };

            match batch {
                Ok(events) => {
                    for event in &events {
                        self.handle_event(event).await;
                    }
                }
                Err(e) => {
                    Metrics::transport_error();
                    warn!(
                        error = %e,
                        delay_ms = self.config.retry_delay.as_millis() as u64,
                        "Chat transport error, retrying"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(self.config.retry_delay) => {}
                        () = shutdown.cancelled() => break,
                    }
                }
            }
        }

        info!("Ingestion loop stopped");
    }
}
