//! Rate extraction over one rendered document snapshot.

use crate::error::OfficialRateError;
use crate::merge::merge_rates;
use crate::official::parse_official_rate;
use crate::table::rows_from_document;
use crate::text::{scope, visible_text};
use crate::types::{RateEntry, RateSet, USD};
use scraper::Html;

/// Region of the page holding the date form and the official statement.
pub const DEFAULT_SCOPE_SELECTOR: &str = "#fm-ex";

/// Extracts a [`RateSet`] from rendered page HTML.
#[derive(Debug, Clone)]
pub struct RateExtractor {
    scope_selector: String,
}

impl Default for RateExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPE_SELECTOR)
    }
}

impl RateExtractor {
    /// Create an extractor that searches for the official statement inside
    /// the element matching `scope_selector` (falling back to `<body>`).
    pub fn new(scope_selector: impl Into<String>) -> Self {
        Self {
            scope_selector: scope_selector.into(),
        }
    }

    /// The official USD entry.
    pub fn official_rate(&self, html: &str) -> Result<RateEntry, OfficialRateError> {
        let document = Html::parse_document(html);
        self.official_from_document(&document)
    }

    /// Full extraction: official rate, table rates, merge.
    ///
    /// A missing or implausible official rate fails the whole extraction;
    /// table rows alone are never returned.
    pub fn extract(&self, date: &str, html: &str) -> Result<RateSet, OfficialRateError> {
        let document = Html::parse_document(html);
        let official = self.official_from_document(&document)?;
        let table = rows_from_document(&document);
        tracing::debug!(
            date,
            official = official.value,
            table_rows = table.len(),
            "extracted rates"
        );

        Ok(RateSet {
            date: date.to_string(),
            entries: merge_rates(official, table),
        })
    }

    fn official_from_document(&self, document: &Html) -> Result<RateEntry, OfficialRateError> {
        let text = visible_text(scope(document, &self.scope_selector));
        let value = parse_official_rate(&text)?;
        RateEntry::new(USD, value).ok_or_else(|| OfficialRateError::Unparseable(value.to_string()))
    }
}
