//! Per-request rate pipeline: validate, navigate, release, extract.

use crate::config::Config;
use crate::navigator::{NavigationError, Navigator};
use crate::renderer::Renderer;
use chrono::NaiveDate;
use nbc_rates::{OfficialRateError, RateExtractor, RateSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Everything that can fail a rate request.
///
/// All variants surface to HTTP clients the same way: a 500 carrying the
/// message.
#[derive(thiserror::Error, Debug)]
pub enum RateError {
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    OfficialRate(#[from] OfficialRateError),

    #[error("rate task failed: {0}")]
    Task(String),
}

/// Left-pad a date string with `0` to ten characters.
///
/// `"2025-1-02"` is not a date either way; this only repairs inputs that lost
/// a leading zero on the year, matching what the page's own form accepts.
pub fn pad_date(raw: &str) -> String {
    let raw = raw.trim();
    let len = raw.chars().count();
    if len >= 10 {
        raw.to_string()
    } else {
        format!("{}{raw}", "0".repeat(10 - len))
    }
}

/// Today's UTC date, `YYYY-MM-DD`.
pub fn today_utc() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn validate_date(date: &str) -> Result<(), RateError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| RateError::InvalidDate(date.to_string()))
}

/// Fetches one date's rates. Cheap to clone; shared by all requests.
#[derive(Clone)]
pub struct RatePipeline {
    renderer: Arc<dyn Renderer>,
    navigator: Navigator,
    extractor: RateExtractor,
}

impl RatePipeline {
    pub fn new(config: Arc<Config>, renderer: Arc<dyn Renderer>) -> Self {
        let extractor = RateExtractor::new(config.selectors.official_scope.clone());
        Self {
            renderer,
            navigator: Navigator::new(config),
            extractor,
        }
    }

    /// The renderer backing this pipeline.
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Fetch the rate set for `date` (`YYYY-MM-DD`).
    ///
    /// The tab is closed exactly once before extraction, on success and on
    /// every navigation failure. The work runs on its own task, so dropping
    /// the returned future (a client hanging up) leaves it to finish and
    /// release the tab.
    pub async fn fetch(&self, date: &str) -> Result<RateSet, RateError> {
        let span = tracing::info_span!("fetch", date);
        let pipeline = self.clone();
        let date = date.to_string();
        let task = async move { pipeline.fetch_inner(&date).await }.instrument(span);

        tokio::task::spawn(task)
            .await
            .unwrap_or_else(|e| Err(RateError::Task(e.to_string())))
    }

    async fn fetch_inner(&self, date: &str) -> Result<RateSet, RateError> {
        validate_date(date)?;
        let start = Instant::now();

        let mut ctx = self
            .renderer
            .new_context()
            .await
            .map_err(|e| NavigationError::Unavailable(format!("{e:#}")))?;

        let loaded = self.navigator.load(ctx.as_mut(), date).await;

        if let Err(e) = ctx.close().await {
            warn!("failed to close browser context: {e:#}");
        }

        let document = loaded?;
        let rates = self.extractor.extract(date, &document.html)?;

        info!(
            url = %document.url,
            entries = rates.len(),
            strategy = %document.strategy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rates fetched"
        );
        Ok(rates)
    }
}
