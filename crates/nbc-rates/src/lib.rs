//! nbc-rates: recover the daily KHR exchange rate table from the rendered
//! National Bank of Cambodia exchange-rate page.
//!
//! Everything in this crate is synchronous and works on an HTML snapshot.
//! Driving the live page to the right date is the runtime's job.

pub mod error;
pub mod extractor;
pub mod merge;
pub mod official;
pub mod table;
pub mod text;
pub mod types;

pub use error::OfficialRateError;
pub use extractor::RateExtractor;
pub use merge::merge_rates;
pub use official::{parse_official_rate, OFFICIAL_RATE_MAX, OFFICIAL_RATE_MIN};
pub use table::table_rates;
pub use types::*;
