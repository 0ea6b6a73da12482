//! Per-currency rates from the page's rate table.
//!
//! Expected row shape: `Currency | Symbol | Unit | Bid | Ask | Average`,
//! where `Symbol` reads like `AUD/KHR`. Rows that don't fit (headers,
//! spacers, layout tables) are skipped, never reported.

use crate::text::collapse_whitespace;
use crate::types::RateEntry;
use scraper::{ElementRef, Html, Selector};

/// Minimum number of `<td>` cells in a rate row.
pub const MIN_CELLS: usize = 6;
/// Column holding the currency pair label.
pub const PAIR_COLUMN: usize = 1;
/// Column holding the average rate.
pub const AVERAGE_COLUMN: usize = 5;

/// Extract every valid rate row, in document order.
///
/// USD rows are skipped: USD comes from the official statement only.
pub fn table_rates(html: &str) -> Vec<RateEntry> {
    let document = Html::parse_document(html);
    rows_from_document(&document)
}

pub(crate) fn rows_from_document(document: &Html) -> Vec<RateEntry> {
    let row_sel = Selector::parse("table tr").expect("row selector is valid");

    let mut entries = Vec::new();
    for row in document.select(&row_sel) {
        let Some(entry) = parse_row(row) else {
            continue;
        };
        if entry.is_usd() {
            tracing::debug!(value = entry.value, "skipping table-sourced USD row");
            continue;
        }
        entries.push(entry);
    }
    entries
}

/// Parse one `<tr>`. Only the row's own `<td>` children count, so nested
/// tables and `<th>` headers don't shift the columns.
fn parse_row(row: ElementRef<'_>) -> Option<RateEntry> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();
    if cells.len() < MIN_CELLS {
        return None;
    }

    let code = currency_code(&cell_text(cells[PAIR_COLUMN]))?;
    let value = parse_rate_value(&cell_text(cells[AVERAGE_COLUMN]))?;
    RateEntry::new(&code, value)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
}

/// `"aud/khr"` → `"AUD"`. Labels without a slash are taken whole.
pub fn currency_code(label: &str) -> Option<String> {
    let code = label.split('/').next().unwrap_or("").trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_ascii_uppercase())
    }
}

/// `"2,872.50"` → `2872.5`. Thousands separators and whitespace are
/// ignored; anything else that isn't a finite number yields `None`.
pub fn parse_rate_value(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
