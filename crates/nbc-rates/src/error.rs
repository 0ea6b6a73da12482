//! Extraction errors.

/// The official USD/KHR statement could not be recovered.
///
/// Table extraction has no error type: malformed rows are skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OfficialRateError {
    #[error("official exchange rate statement not found; the page layout may have changed")]
    NotFound,

    #[error("official exchange rate {0:?} is not a number")]
    Unparseable(String),

    #[error("official exchange rate {value} is outside the plausible range ({min}, {max}); the page layout may have changed")]
    Implausible { value: f64, min: f64, max: f64 },
}
