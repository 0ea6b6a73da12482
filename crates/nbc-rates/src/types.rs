//! Core data types for extracted exchange rates.

use serde::{Deserialize, Serialize};

/// Currency code used for the official rate.
pub const USD: &str = "USD";

/// One currency's KHR value.
///
/// Serialized as `{ "currency": "AUD", "avg": 2872.5 }` to match the
/// published JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Upper-cased currency code.
    pub currency: String,
    /// KHR per one unit of `currency`. Finite and positive.
    #[serde(rename = "avg")]
    pub value: f64,
}

impl RateEntry {
    /// Build an entry, normalizing the code and rejecting values that are
    /// not finite and positive.
    pub fn new(currency: &str, value: f64) -> Option<Self> {
        let currency = currency.trim().to_ascii_uppercase();
        if currency.is_empty() || !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(Self { currency, value })
    }

    /// Whether this entry is the USD rate.
    pub fn is_usd(&self) -> bool {
        self.currency == USD
    }
}

/// All rates for one requested date.
///
/// The official USD entry, when present, is first; table rows follow in
/// page order. Codes are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSet {
    /// Requested date, `YYYY-MM-DD`.
    pub date: String,
    /// Ordered, deduplicated entries.
    pub entries: Vec<RateEntry>,
}

impl RateSet {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
