//! Precision-safe price type for trade signals.
//!
//! Uses `rust_decimal` so that a submitted `"49000.1"` is stored and
//! rendered as exactly that value. Input is first checked as a finite
//! number, then converted; the two failures are reported separately.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Parse a finite decimal from text.
    ///
    /// Accepts plain (`"50000"`, `"-1.25"`) and scientific (`"1e3"`)
    /// notation, surrounding whitespace allowed. The whole string must be a
    /// finite number: `"50000abc"`, `"1_000"` and `"Infinity"` are
    /// `NotANumber`. Finite values beyond the decimal range (about
    /// 7.9e28) are `PriceOutOfRange`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let not_a_number = || CoreError::NotANumber(raw.to_string());
        if trimmed.is_empty() || trimmed.contains('_') {
            return Err(not_a_number());
        }

        let float: f64 = trimmed.parse().map_err(|_| not_a_number())?;
        if !float.is_finite() {
            return Err(not_a_number());
        }

        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
            .or_else(|| Decimal::from_f64(float))
            .map(Self::new)
            .ok_or_else(|| CoreError::PriceOutOfRange(trimmed.to_string()))
    }

    /// Parse a finite decimal from a JSON value (number or numeric string).
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => Self::parse(&n.to_string()),
            Value::String(s) => Self::parse(s),
            other => Err(CoreError::NotANumber(other.to_string())),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self::new(d)
    }
}

/// Serialized as a JSON number: integral values without a fraction.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.scale() == 0 {
            if let Some(i) = self.0.to_i64() {
                return serializer.serialize_i64(i);
            }
        }
        match self.0.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
    }
}
