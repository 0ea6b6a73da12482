//! Official USD/KHR rate, published as free text outside the rate table.
//!
//! Recovery is two-staged: a syntactic match on the
//! `Official Exchange Rate : <n> KHR / USD` statement, then a range check
//! that rejects numbers of the wrong magnitude (a calendar year that happens
//! to sit next to the phrase, for instance).

use crate::error::OfficialRateError;
use regex::Regex;
use std::sync::OnceLock;

/// Exclusive lower bound of a plausible USD/KHR rate.
pub const OFFICIAL_RATE_MIN: f64 = 3000.0;
/// Exclusive upper bound of a plausible USD/KHR rate.
pub const OFFICIAL_RATE_MAX: f64 = 5000.0;

fn official_rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)official\s+exchange\s+rate\s*:\s*([\d,]+(?:\.\d+)?)\s*KHR\s*/\s*USD")
            .expect("official rate regex is valid")
    })
}

/// Find the official rate statement in whitespace-normalized text and
/// return its value.
///
/// Fails with [`OfficialRateError::NotFound`] when the statement is absent
/// and [`OfficialRateError::Implausible`] when the value lies outside
/// `(OFFICIAL_RATE_MIN, OFFICIAL_RATE_MAX)`.
pub fn parse_official_rate(text: &str) -> Result<f64, OfficialRateError> {
    let caps = official_rate_regex()
        .captures(text)
        .ok_or(OfficialRateError::NotFound)?;
    let raw = &caps[1];

    let value: f64 = raw
        .replace(',', "")
        .parse()
        .map_err(|_| OfficialRateError::Unparseable(raw.to_string()))?;
    if !value.is_finite() {
        return Err(OfficialRateError::Unparseable(raw.to_string()));
    }

    if value > OFFICIAL_RATE_MIN && value < OFFICIAL_RATE_MAX {
        Ok(value)
    } else {
        Err(OfficialRateError::Implausible {
            value,
            min: OFFICIAL_RATE_MIN,
            max: OFFICIAL_RATE_MAX,
        })
    }
}
