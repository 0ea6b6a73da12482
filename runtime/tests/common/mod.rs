//! In-memory stand-in for the browser, shared by integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use nbc_rates_runtime::config::{Config, Timeouts};
use nbc_rates_runtime::renderer::{LoadProbe, NavigationResult, RenderContext, Renderer};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Date the page opens on before any submission.
pub const STALE_DATE: &str = "2025-06-30";

/// Average shown for AUD before any submission.
pub const STALE_AUD: &str = "2,801.00";

/// How the fake page reacts.
#[derive(Debug, Clone)]
pub struct PageBehavior {
    pub navigate_fails: bool,
    pub has_date_input: bool,
    pub has_submit: bool,
    /// The page's change handler sees a direct assignment.
    pub direct_set_works: bool,
    /// The page's change handler sees typed keys.
    pub typing_works: bool,
    /// Number of initial page reads that fail as if mid-navigation.
    pub eval_failures: usize,
    /// How long the form post takes to show the requested date.
    pub submit_delay: Duration,
    /// How long a click blocks before returning.
    pub click_delay: Duration,
    /// Submission rewrites the tables without loading a new document.
    pub updates_in_place: bool,
    /// Official statement shown for the requested date; `None` omits it.
    pub official: Option<String>,
    /// Rate table rows for the requested date as `(pair, average)`.
    pub rows: Vec<(String, String)>,
}

impl Default for PageBehavior {
    fn default() -> Self {
        Self {
            navigate_fails: false,
            has_date_input: true,
            has_submit: true,
            direct_set_works: true,
            typing_works: true,
            eval_failures: 0,
            submit_delay: Duration::ZERO,
            click_delay: Duration::ZERO,
            updates_in_place: false,
            official: Some("4,024".to_string()),
            rows: vec![
                ("AUD/KHR".to_string(), "2,872.50".to_string()),
                ("EUR/KHR".to_string(), "4,400.10".to_string()),
            ],
        }
    }
}

impl PageBehavior {
    /// The page as served, with the date form's layout table always present.
    fn render(&self, shown: &Shown) -> String {
        let stale_rows = [
            ("AUD/KHR".to_string(), STALE_AUD.to_string()),
            ("EUR/KHR".to_string(), "4,310.00".to_string()),
        ];
        let (official, rows) = if shown.requested {
            (self.official.clone(), &self.rows[..])
        } else {
            (Some("4,010".to_string()), &stale_rows[..])
        };

        let official = official
            .map(|v| format!("Official Exchange Rate : <font>{v}</font> KHR / USD"))
            .unwrap_or_default();
        let input = if self.has_date_input {
            format!(r#"<input id="datepicker" value="{}">"#, shown.date)
        } else {
            String::new()
        };
        let rows: String = rows
            .iter()
            .map(|(pair, avg)| {
                format!("<tr><td>x</td><td>{pair}</td><td>1</td><td>0</td><td>0</td><td>{avg}</td></tr>")
            })
            .collect();
        format!(
            r#"<html><body><form id="fm-ex"><table><tr><td>Date</td><td>{input}</td><td><input type="submit" name="view" value="View"></td></tr></table>{official}</form><table>{rows}</table></body></html>"#
        )
    }
}

/// Everything the fake observed, shared with the test.
#[derive(Debug, Default)]
pub struct Observed {
    pub calls: Vec<String>,
    pub contexts_opened: usize,
    pub contexts_closed: usize,
}

/// What the page currently displays.
#[derive(Debug, Clone, Default, Hash)]
struct Shown {
    date: String,
    /// Showing the submitted date rather than the page's opening state.
    requested: bool,
}

#[derive(Debug, Default)]
struct PageState {
    loaded: bool,
    marker: Option<String>,
    pending_date: Option<String>,
    /// A submitted date and when its result lands.
    landing: Option<(Instant, String)>,
    shown: Shown,
    resources: u64,
    eval_failures_left: usize,
}

impl PageState {
    /// Apply a submission whose result is due.
    fn advance(&mut self, updates_in_place: bool) {
        let due = matches!(&self.landing, Some((at, _)) if Instant::now() >= *at);
        if !due {
            return;
        }
        if let Some((_, date)) = self.landing.take() {
            self.shown = Shown {
                date,
                requested: true,
            };
            self.resources += 2;
            if !updates_in_place {
                self.marker = None;
            }
        }
    }

    fn tables_digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.shown.hash(&mut hasher);
        hasher.finish()
    }
}

pub struct FakeRenderer {
    behavior: PageBehavior,
    pub observed: Arc<Mutex<Observed>>,
    active: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn new(behavior: PageBehavior) -> Self {
        Self {
            behavior,
            observed: Arc::new(Mutex::new(Observed::default())),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.observed.lock().unwrap().calls.clone()
    }

    pub fn opened(&self) -> usize {
        self.observed.lock().unwrap().contexts_opened
    }

    pub fn closed(&self) -> usize {
        self.observed.lock().unwrap().contexts_closed
    }

    /// A context not tracked by the renderer, for driving the navigator
    /// directly.
    pub fn context(&self) -> FakeContext {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.observed.lock().unwrap().contexts_opened += 1;
        FakeContext {
            behavior: self.behavior.clone(),
            state: Mutex::new(PageState {
                eval_failures_left: self.behavior.eval_failures,
                ..Default::default()
            }),
            observed: Arc::clone(&self.observed),
            active: Arc::clone(&self.active),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(self.context()))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct FakeContext {
    behavior: PageBehavior,
    state: Mutex<PageState>,
    observed: Arc<Mutex<Observed>>,
    active: Arc<AtomicUsize>,
}

impl FakeContext {
    fn record(&self, call: impl Into<String>) {
        self.observed.lock().unwrap().calls.push(call.into());
    }

    fn page(&self) -> MutexGuard<'_, PageState> {
        let mut state = self.state.lock().unwrap();
        state.advance(self.behavior.updates_in_place);
        state
    }
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.record(format!("navigate {url}"));
        if self.behavior.navigate_fails {
            bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        let mut state = self.state.lock().unwrap();
        state.loaded = true;
        state.marker = None;
        state.shown = Shown {
            date: STALE_DATE.to_string(),
            requested: false,
        };
        state.resources += 3;
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn get_html(&self) -> Result<String> {
        self.record("get_html");
        let shown = self.page().shown.clone();
        Ok(self.behavior.render(&shown))
    }

    async fn get_url(&self) -> Result<String> {
        Ok("https://nbc.test/exchange_rate.php".to_string())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click {selector}"));
        if !self.behavior.has_submit {
            bail!("element not found: {selector}");
        }
        if !self.behavior.click_delay.is_zero() {
            tokio::time::sleep(self.behavior.click_delay).await;
        }
        let mut state = self.page();
        state.resources += 1;
        if let Some(date) = state.pending_date.take() {
            state.landing = Some((Instant::now() + self.behavior.submit_delay, date));
        }
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.record(format!("type_into {selector} {text}"));
        if !self.behavior.has_date_input {
            bail!("element not found: {selector}");
        }
        if self.behavior.typing_works {
            self.state.lock().unwrap().pending_date = Some(text.to_string());
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.observed.lock().unwrap().contexts_closed += 1;
        Ok(())
    }

    async fn selector_exists(&self, selector: &str) -> Result<bool> {
        let state = self.page();
        Ok(match selector {
            "#datepicker" => state.loaded && self.behavior.has_date_input,
            "table" => state.loaded,
            _ => false,
        })
    }

    async fn set_value_and_notify(&self, selector: &str, value: &str) -> Result<bool> {
        self.record(format!("set_value {selector} {value}"));
        if !self.behavior.has_date_input {
            return Ok(false);
        }
        if self.behavior.direct_set_works {
            self.state.lock().unwrap().pending_date = Some(value.to_string());
        }
        Ok(true)
    }

    async fn mark_document(&self, token: &str) -> Result<()> {
        self.page().marker = Some(token.to_string());
        Ok(())
    }

    async fn probe(&self, _table_selector: &str) -> Result<LoadProbe> {
        let mut state = self.page();
        if state.eval_failures_left > 0 {
            state.eval_failures_left -= 1;
            return Err(anyhow!("Execution context was destroyed"));
        }
        Ok(LoadProbe {
            url: "https://nbc.test/exchange_rate.php".to_string(),
            ready_state: if state.loaded { "complete" } else { "loading" }.to_string(),
            resources: state.resources,
            has_table: state.loaded,
            marker: state.marker.clone(),
            tables_digest: state.tables_digest(),
        })
    }
}

/// Configuration with waits short enough for tests.
pub fn test_config() -> Arc<Config> {
    let mut config = Config::default();
    config.target_url = "https://nbc.test/exchange_rate.php".parse().unwrap();
    config.timeouts = Timeouts {
        navigation: Duration::from_millis(500),
        selector: Duration::from_millis(100),
        settle: Duration::from_millis(150),
        quiet_window: Duration::from_millis(10),
        poll_interval: Duration::from_millis(2),
        grace: Duration::ZERO,
    };
    Arc::new(config)
}
