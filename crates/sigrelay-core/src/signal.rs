//! Trade signal types and the text templates derived from them.

use crate::error::{CoreError, Result};
use crate::price::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signal direction.
///
/// Stored and rendered with the localized tokens `COMPRA` / `VENDA`;
/// `BUY` / `SELL` are accepted as input aliases. Parsing is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "COMPRA", alias = "BUY")]
    Buy,
    #[serde(rename = "VENDA", alias = "SELL")]
    Sell,
}

impl SignalType {
    /// Accepted (uppercased) input tokens.
    pub const ALLOWED: [&'static str; 4] = ["COMPRA", "VENDA", "BUY", "SELL"];

    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "COMPRA",
            Self::Sell => "VENDA",
        }
    }

    /// Parse after uppercasing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "COMPRA" | "BUY" => Some(Self::Buy),
            "VENDA" | "SELL" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| CoreError::InvalidSignalType(s.to_string()))
    }
}

/// A stored trade signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub id: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub entry: Price,
    pub sl: Price,
    pub tp: Price,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl TradeSignal {
    /// Text of the companion message stored with every signal.
    pub fn derived_message_text(&self) -> String {
        derived_message_text(&self.symbol, self.signal_type, self.entry, self.sl, self.tp)
    }
}

/// A validated signal ready to be stored.
///
/// The symbol is uppercased on construction; when no description is given
/// one is derived as `{symbol} - {type} em {entry}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTradeSignal {
    symbol: String,
    signal_type: SignalType,
    entry: Price,
    sl: Price,
    tp: Price,
    text: String,
}

impl NewTradeSignal {
    pub fn new(
        symbol: &str,
        signal_type: SignalType,
        entry: Price,
        sl: Price,
        tp: Price,
        text: Option<String>,
    ) -> Result<Self> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(CoreError::EmptySymbol);
        }
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{symbol} - {signal_type} em {entry}"));
        Ok(Self {
            symbol,
            signal_type,
            entry,
            sl,
            tp,
            text,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    pub fn entry(&self) -> Price {
        self.entry
    }

    pub fn sl(&self) -> Price {
        self.sl
    }

    pub fn tp(&self) -> Price {
        self.tp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn derived_message_text(&self) -> String {
        derived_message_text(&self.symbol, self.signal_type, self.entry, self.sl, self.tp)
    }
}

/// `SINAL\nPAR: {symbol}\n{type}\nENTRADA: {entry}\nSL: {sl}\nTP: {tp}`
fn derived_message_text(
    symbol: &str,
    signal_type: SignalType,
    entry: Price,
    sl: Price,
    tp: Price,
) -> String {
    format!("SINAL\nPAR: {symbol}\n{signal_type}\nENTRADA: {entry}\nSL: {sl}\nTP: {tp}")
}
