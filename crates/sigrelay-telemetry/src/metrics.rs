//! Prometheus metrics for sigrelay.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge_vec, CounterVec, Encoder,
    IntCounter, IntGaugeVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Messages stored by the ingestion adapter.
/// Labels: kind (message/channel_post)
pub static MESSAGES_INGESTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigrelay_messages_ingested_total",
        "Chat events stored as messages",
        &["kind"]
    )
    .unwrap()
});

/// Chat events not stored.
/// Labels: reason (other_chat/no_target/no_text/timeout)
pub static EVENTS_DISCARDED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigrelay_events_discarded_total",
        "Chat events discarded by the ingestion adapter",
        &["reason"]
    )
    .unwrap()
});

/// Accepted chat events whose message write failed.
pub static INGEST_WRITE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigrelay_ingest_write_failures_total",
        "Accepted chat events the store failed to persist"
    )
    .unwrap()
});

/// Errors returned by the chat transport while polling.
pub static TRANSPORT_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigrelay_transport_errors_total",
        "Errors surfaced by the chat transport poll"
    )
    .unwrap()
});

/// Trade signals persisted.
/// Labels: type (COMPRA/VENDA)
pub static SIGNALS_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigrelay_signals_created_total",
        "Trade signals persisted",
        &["type"]
    )
    .unwrap()
});

/// Rejected trade signal items.
/// Labels: error (MissingFieldsError/InvalidTypeError/InvalidNumberError/
/// NumberOutOfRangeError/PersistenceError)
pub static SIGNAL_ITEM_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigrelay_signal_item_errors_total",
        "Trade signal submissions rejected per item",
        &["error"]
    )
    .unwrap()
});

/// Lifecycle state (1 = current).
/// Labels: state (init/connecting/ready/draining/stopped/failed)
pub static LIFECYCLE_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "sigrelay_lifecycle_state",
        "Current lifecycle state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

const LIFECYCLE_STATES: [&str; 6] = [
    "init",
    "connecting",
    "ready",
    "draining",
    "stopped",
    "failed",
];

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a stored chat event.
    pub fn message_ingested(kind: &str) {
        MESSAGES_INGESTED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a discarded chat event.
    pub fn event_discarded(reason: &str) {
        EVENTS_DISCARDED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a failed ingestion write.
    pub fn ingest_write_failed() {
        INGEST_WRITE_FAILURES_TOTAL.inc();
    }

    /// Record a transport poll error.
    pub fn transport_error() {
        TRANSPORT_ERRORS_TOTAL.inc();
    }

    /// Record a persisted trade signal.
    pub fn signal_created(signal_type: &str) {
        SIGNALS_CREATED_TOTAL.with_label_values(&[signal_type]).inc();
    }

    /// Record a rejected trade signal item.
    pub fn signal_item_error(error: &str) {
        SIGNAL_ITEM_ERRORS_TOTAL.with_label_values(&[error]).inc();
    }

    /// Set the lifecycle state. Only the active state is 1.
    pub fn lifecycle_state_set(state: &str) {
        for s in LIFECYCLE_STATES {
            LIFECYCLE_STATE.with_label_values(&[s]).set(0);
        }
        LIFECYCLE_STATE.with_label_values(&[state]).set(1);
    }

    /// Render the default registry in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_render() {
        Metrics::message_ingested("message");
        Metrics::event_discarded("other_chat");
        Metrics::signal_item_error("InvalidTypeError");

        let text = Metrics::render().unwrap();
        assert!(text.contains("sigrelay_messages_ingested_total"));
        assert!(text.contains("sigrelay_events_discarded_total"));
        assert!(text.contains("InvalidTypeError"));
    }

    #[test]
    fn test_ingest_write_failures_counted_separately() {
        let before = INGEST_WRITE_FAILURES_TOTAL.get();
        Metrics::ingest_write_failed();
        assert!(INGEST_WRITE_FAILURES_TOTAL.get() > before);
        assert!(Metrics::render()
            .unwrap()
            .contains("sigrelay_ingest_write_failures_total"));
    }

    #[test]
    fn test_lifecycle_state_is_exclusive() {
        Metrics::lifecycle_state_set("connecting");
        Metrics::lifecycle_state_set("ready");
        assert_eq!(LIFECYCLE_STATE.with_label_values(&["ready"]).get(), 1);
        assert_eq!(LIFECYCLE_STATE.with_label_values(&["connecting"]).get(), 0);
    }
}
