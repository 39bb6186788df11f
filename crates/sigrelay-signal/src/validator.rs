//! Per-item trade signal validation and persistence.

use serde_json::Value;
use sigrelay_core::{CoreError, NewMessage, NewTradeSignal, Price, SignalType, TradeSignal};
use sigrelay_store::DynRecordStore;
use sigrelay_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::batch::{BatchOutcome, ItemFailure};
use crate::error::ItemError;

/// Fields every submission must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["symbol", "type", "entry", "sl", "tp"];

/// Numeric fields, in the order they are checked.
pub const NUMERIC_FIELDS: [&str; 3] = ["entry", "sl", "tp"];

/// Absent, `null` and `""` count as missing. `0` and `false` are present.
/// A `symbol` made only of whitespace is missing too.
fn is_present(field: &str, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) if field == "symbol" => !s.trim().is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn missing_fields(item: &Value) -> ItemError {
    ItemError::MissingFields {
        required: REQUIRED_FIELDS.to_vec(),
        item: item.clone(),
    }
}

/// Validate one submission without touching the store.
///
/// Checks run in a fixed order and the first failure is reported:
/// presence, type, then `entry`, `sl`, `tp`.
pub fn validate_item(item: &Value) -> Result<NewTradeSignal, ItemError> {
    if !REQUIRED_FIELDS.iter().all(|f| is_present(f, item.get(f))) {
        return Err(missing_fields(item));
    }

    let raw_type = &item["type"];
    let signal_type = raw_type
        .as_str()
        .and_then(SignalType::parse)
        .ok_or_else(|| ItemError::InvalidType {
            allowed: SignalType::ALLOWED.to_vec(),
            received: raw_type.clone(),
        })?;

    let mut prices = [Price::default(); 3];
    for (slot, field) in prices.iter_mut().zip(NUMERIC_FIELDS) {
        let value = &item[field];
        *slot = Price::from_json(value).map_err(|e| match e {
            CoreError::PriceOutOfRange(_) => ItemError::NumberOutOfRange {
                field,
                value: value.clone(),
            },
            _ => ItemError::InvalidNumber {
                field,
                value: value.clone(),
            },
        })?;
    }
    let [entry, sl, tp] = prices;

    let text = item
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string);

    NewTradeSignal::new(&as_text(&item["symbol"]), signal_type, entry, sl, tp, text)
        .map_err(|_| missing_fields(item))
}

/// Validates and persists signal batches.
pub struct SignalValidator {
    store: DynRecordStore,
}

impl SignalValidator {
    pub fn new(store: DynRecordStore) -> Self {
        Self { store }
    }

    /// Process submissions sequentially. Never fails as a whole; every
    /// item ends up either created or in the error list.
    pub async fn submit(&self, items: Vec<Value>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let count = items.len();

        for (index, item) in items.into_iter().enumerate() {
            let result = match validate_item(&item) {
                Ok(signal) => self.persist(signal, &item).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(signal) => {
                    Metrics::signal_created(signal.signal_type.as_str());
                    outcome.created.push(signal);
                }
                Err(e) => {
                    debug!(index, error = e.name(), details = %e, "Signal submission rejected");
                    Metrics::signal_item_error(e.name());
                    outcome.errors.push(ItemFailure::new(index, e));
                }
            }
        }

        info!(
            submitted = count,
            created = outcome.created.len(),
            errors = outcome.errors.len(),
            "Signal batch processed"
        );
        outcome
    }

    /// Store the signal, then its derived message. No transaction spans
    /// the two writes.
    async fn persist(&self, signal: NewTradeSignal, item: &Value) -> Result<TradeSignal, ItemError> {
        let derived_text = signal.derived_message_text();

        let stored = self
            .store
            .create_trade_signal(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to store trade signal");
                ItemError::Persistence {
                    message: e.to_string(),
                    item: item.clone(),
                    signal_id: None,
                }
            })?;

        let derived = NewMessage::new(derived_text).map_err(|e| ItemError::Persistence {
            message: e.to_string(),
            item: item.clone(),
            signal_id: Some(stored.id),
        })?;

        if let Err(e) = self.store.create_message(derived).await {
            warn!(
                signal_id = stored.id,
                error = %e,
                "Trade signal stored but derived message failed"
            );
            return Err(ItemError::Persistence {
                message: e.to_string(),
                item: item.clone(),
                signal_id: Some(stored.id),
            });
        }

        Ok(stored)
    }
}
