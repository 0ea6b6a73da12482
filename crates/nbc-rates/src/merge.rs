//! Combine the official rate with the table rates.

use crate::types::RateEntry;
use std::collections::HashSet;

/// Official entry first, then table entries in order.
///
/// The first occurrence of a currency code wins, so the official USD entry
/// always beats a table USD row should the page ever start listing one.
pub fn merge_rates(official: RateEntry, table: Vec<RateEntry>) -> Vec<RateEntry> {
    let mut seen = HashSet::with_capacity(table.len() + 1);
    let mut merged = Vec::with_capacity(table.len() + 1);

    for entry in std::iter::once(official).chain(table) {
        if seen.insert(entry.currency.clone()) {
            merged.push(entry);
        } else {
            tracing::debug!(currency = %entry.currency, "dropping duplicate rate");
        }
    }
    merged
}
