//! Document navigator: drives the exchange-rate page to a requested date.
//!
//! The page only updates when its own client-side handlers see the date
//! change, so setting the date is a fallback chain:
//!
//! 1. [`DateInputStrategy::DirectSet`]: assign the value, dispatch
//!    `input` and `change`.
//! 2. [`DateInputStrategy::FocusAndType`]: focus, select all, type the date
//!    key by key.
//!
//! Before each attempt the document is tagged with a one-off token. After
//! the view control is clicked, the submission counts as landed once the
//! token is gone (the form posted and a new document loaded) or the table
//! text differs from before (the page updated in place). From then on the
//! document must settle (no URL, readiness, resource, or table changes for a
//! quiet window) with a table present. The page already carries a layout
//! table before any submission, so a table alone proves nothing. The second
//! strategy runs only if the first never lands and settles.

use crate::config::{Config, PageSelectors, Timeouts};
use crate::renderer::{LoadProbe, RenderContext};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A step of the navigation sequence, named in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    Open,
    LocateDateInput,
    SetDate,
    Submit,
    AwaitTable,
}

impl fmt::Display for NavStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavStep::Open => "open page",
            NavStep::LocateDateInput => "locate date input",
            NavStep::SetDate => "set date",
            NavStep::Submit => "submit form",
            NavStep::AwaitTable => "await rate table",
        };
        f.write_str(name)
    }
}

/// Navigation failures. No partial result accompanies any of them.
#[derive(thiserror::Error, Debug)]
pub enum NavigationError {
    #[error("rendering environment unavailable: {0}")]
    Unavailable(String),

    #[error("{step} failed: {reason}")]
    Step { step: NavStep, reason: String },

    #[error("{step} timed out after {waited_ms}ms")]
    Timeout { step: NavStep, waited_ms: u64 },
}

impl NavigationError {
    /// The step that failed, if any.
    pub fn step(&self) -> Option<NavStep> {
        match self {
            NavigationError::Unavailable(_) => None,
            NavigationError::Step { step, .. } | NavigationError::Timeout { step, .. } => {
                Some(*step)
            }
        }
    }

    fn step_failed(step: NavStep, err: impl fmt::Display) -> Self {
        NavigationError::Step {
            step,
            reason: err.to_string(),
        }
    }

    fn timeout(step: NavStep, waited: Duration) -> Self {
        NavigationError::Timeout {
            step,
            waited_ms: waited.as_millis() as u64,
        }
    }
}

/// How the date is written into the date control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInputStrategy {
    DirectSet,
    FocusAndType,
}

impl DateInputStrategy {
    /// Order in which strategies are attempted.
    pub const CHAIN: [DateInputStrategy; 2] =
        [DateInputStrategy::DirectSet, DateInputStrategy::FocusAndType];
}

impl fmt::Display for DateInputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInputStrategy::DirectSet => f.write_str("direct-set"),
            DateInputStrategy::FocusAndType => f.write_str("focus-and-type"),
        }
    }
}

/// The stabilized page, captured before its tab is closed.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub html: String,
    pub url: String,
    /// The strategy that produced this state.
    pub strategy: DateInputStrategy,
}

/// The page as it was just before a submission.
#[derive(Debug)]
struct SubmitMark {
    token: String,
    /// `None` when the page could not be read before submitting.
    tables_digest: Option<u64>,
}

impl SubmitMark {
    /// The page in `probe` is no longer the one that was marked.
    fn superseded_by(&self, probe: &LoadProbe) -> bool {
        probe.marker.as_deref() != Some(self.token.as_str())
            || self
                .tables_digest
                .is_some_and(|digest| digest != probe.tables_digest)
    }
}

/// Drives one tab through open, set date, submit, settle.
#[derive(Debug, Clone)]
pub struct Navigator {
    config: Arc<Config>,
}

impl Navigator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn selectors(&self) -> &PageSelectors {
        &self.config.selectors
    }

    fn timeouts(&self) -> &Timeouts {
        &self.config.timeouts
    }

    /// Bring `ctx` to the page state for `date` and snapshot it.
    ///
    /// `ctx` is borrowed: closing it stays with the caller.
    pub async fn load(
        &self,
        ctx: &mut dyn RenderContext,
        date: &str,
    ) -> Result<RenderedDocument, NavigationError> {
        self.open(ctx).await?;

        let mut last_err = None;
        for strategy in DateInputStrategy::CHAIN {
            self.wait_for_selector(ctx, &self.selectors().date_input, NavStep::LocateDateInput)
                .await?;

            match self.attempt(ctx, date, strategy).await {
                Ok(()) => return self.snapshot(ctx, strategy).await,
                Err(e @ NavigationError::Timeout { step: NavStep::AwaitTable, .. }) => {
                    warn!(%strategy, error = %e, "date submission did not produce a table");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| NavigationError::timeout(NavStep::AwaitTable, Duration::ZERO)))
    }

    async fn open(&self, ctx: &mut dyn RenderContext) -> Result<(), NavigationError> {
        let url = self.config.target_url.as_str();
        let timeout = self.timeouts().navigation;
        debug!(url, "opening page");

        let nav = ctx
            .navigate(url, timeout.as_millis() as u64)
            .await
            .map_err(|e| NavigationError::step_failed(NavStep::Open, format!("{e:#}")))?;
        debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "navigation committed");

        // DOMContentLoaded is enough; the page may never stop loading ads.
        let start = Instant::now();
        loop {
            if let Ok(probe) = ctx.probe(&self.selectors().table).await {
                if probe.dom_ready() {
                    return Ok(());
                }
            }
            if start.elapsed() >= timeout {
                return Err(NavigationError::timeout(NavStep::Open, start.elapsed()));
            }
            tokio::time::sleep(self.timeouts().poll_interval).await;
        }
    }

    async fn wait_for_selector(
        &self,
        ctx: &dyn RenderContext,
        selector: &str,
        step: NavStep,
    ) -> Result<(), NavigationError> {
        let timeout = self.timeouts().selector;
        let start = Instant::now();
        loop {
            match ctx.selector_exists(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!(selector, "selector probe failed: {e:#}"),
            }
            if start.elapsed() >= timeout {
                return Err(NavigationError::timeout(step, start.elapsed()));
            }
            tokio::time::sleep(self.timeouts().poll_interval).await;
        }
    }

    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        date: &str,
        strategy: DateInputStrategy,
    ) -> Result<(), NavigationError> {
        let selectors = self.selectors();
        let before = self.mark_before_submit(ctx, strategy).await?;
        debug!(%strategy, date, token = %before.token, "setting date");

        match strategy {
            DateInputStrategy::DirectSet => {
                let found = ctx
                    .set_value_and_notify(&selectors.date_input, date)
                    .await
                    .map_err(|e| NavigationError::step_failed(NavStep::SetDate, format!("{e:#}")))?;
                if !found {
                    return Err(NavigationError::step_failed(
                        NavStep::SetDate,
                        format!("element not found: {}", selectors.date_input),
                    ));
                }
            }
            DateInputStrategy::FocusAndType => {
                ctx.type_into(&selectors.date_input, date)
                    .await
                    .map_err(|e| NavigationError::step_failed(NavStep::SetDate, format!("{e:#}")))?;
            }
        }

        ctx.click(&selectors.submit)
            .await
            .map_err(|e| NavigationError::step_failed(NavStep::Submit, format!("{e:#}")))?;

        self.wait_settled(ctx, &before).await
    }

    /// Tag the document and record the table text, so the submission that
    /// follows can be told apart from the page as it was.
    async fn mark_before_submit(
        &self,
        ctx: &dyn RenderContext,
        strategy: DateInputStrategy,
    ) -> Result<SubmitMark, NavigationError> {
        static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

        let tables_digest = match ctx.probe(&self.selectors().table).await {
            Ok(probe) => Some(probe.tables_digest),
            Err(e) => {
                debug!("load probe before submit failed: {e:#}");
                None
            }
        };
        let token = format!("{strategy}-{}", NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        ctx.mark_document(&token)
            .await
            .map_err(|e| NavigationError::step_failed(NavStep::SetDate, format!("{e:#}")))?;

        Ok(SubmitMark {
            token,
            tables_digest,
        })
    }

    /// Poll until the submission has landed and the page is quiet with a
    /// table.
    ///
    /// Covers both a full reload on submit (token gone, URL/readiness churn,
    /// then calm) and an in-place update (table text changed, resource churn,
    /// then calm). Probe failures mean the page is mid-navigation and restart
    /// the quiet window.
    async fn wait_settled(
        &self,
        ctx: &dyn RenderContext,
        before: &SubmitMark,
    ) -> Result<(), NavigationError> {
        let timeouts = self.timeouts();
        let start = Instant::now();
        let mut last: Option<LoadProbe> = None;
        let mut landed = false;
        let mut quiet_since = Instant::now();

        loop {
            match ctx.probe(&self.selectors().table).await {
                Ok(probe) => {
                    if !landed && before.superseded_by(&probe) {
                        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "submission landed");
                        landed = true;
                        quiet_since = Instant::now();
                    }
                    if last.as_ref() != Some(&probe) {
                        last = Some(probe);
                        quiet_since = Instant::now();
                    } else if landed
                        && probe.dom_ready()
                        && probe.has_table
                        && quiet_since.elapsed() >= timeouts.quiet_window
                    {
                        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "page settled");
                        return Ok(());
                    }
                }
                Err(e) => {
                    debug!("load probe failed: {e:#}");
                    last = None;
                    quiet_since = Instant::now();
                }
            }

            if start.elapsed() >= timeouts.settle {
                return Err(NavigationError::timeout(NavStep::AwaitTable, start.elapsed()));
            }
            tokio::time::sleep(timeouts.poll_interval).await;
        }
    }

    async fn snapshot(
        &self,
        ctx: &dyn RenderContext,
        strategy: DateInputStrategy,
    ) -> Result<RenderedDocument, NavigationError> {
        let grace = self.timeouts().grace;
        if !grace.is_zero() {
            tokio::time::sleep(grace).await;
        }

        // Quiescence alone is not proof; the table must still be there.
        let table = &self.selectors().table;
        let present = ctx
            .selector_exists(table)
            .await
            .map_err(|e| NavigationError::step_failed(NavStep::AwaitTable, format!("{e:#}")))?;
        if !present {
            return Err(NavigationError::step_failed(
                NavStep::AwaitTable,
                format!("{table} disappeared after the page settled"),
            ));
        }

        let html = ctx
            .get_html()
            .await
            .map_err(|e| NavigationError::step_failed(NavStep::AwaitTable, format!("{e:#}")))?;
        let url = ctx.get_url().await.unwrap_or_default();

        Ok(RenderedDocument {
            html,
            url,
            strategy,
        })
    }
}
