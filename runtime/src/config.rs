//! Process-wide configuration.
//!
//! Resolved once at startup (CLI flag, then environment, then default) and
//! shared read-only as `Arc<Config>`.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Exchange-rate page of the National Bank of Cambodia.
pub const DEFAULT_TARGET_URL: &str =
    "https://www.nbc.gov.kh/english/economic_research/exchange_rate.php";

/// Chromium flags suited to containers and small hosts.
pub const DEFAULT_LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-zygote",
];

/// Selectors for the parts of the page the navigator touches.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSelectors {
    /// Date text input.
    pub date_input: String,
    /// The "View" submit control.
    pub submit: String,
    /// Must be present before extraction.
    pub table: String,
    /// Region holding the official rate statement.
    pub official_scope: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            date_input: "#datepicker".to_string(),
            submit: r#"input[name="view"]"#.to_string(),
            table: "table".to_string(),
            official_scope: nbc_rates::extractor::DEFAULT_SCOPE_SELECTOR.to_string(),
        }
    }
}

/// Bounds on every wait the navigator performs.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    /// Page open until DOMContentLoaded.
    pub navigation: Duration,
    /// Waiting for the date control to appear.
    pub selector: Duration,
    /// Submit until the document settles with a table.
    pub settle: Duration,
    /// How long the page must stay unchanged to count as quiet.
    pub quiet_window: Duration,
    /// Delay between readiness probes.
    pub poll_interval: Duration,
    /// Extra wait after quiescence for trailing DOM updates.
    pub grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(30_000),
            selector: Duration::from_millis(10_000),
            settle: Duration::from_millis(20_000),
            quiet_window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            grace: Duration::from_millis(800),
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    /// Explicit Chromium binary; discovered when `None`.
    pub chromium_path: Option<PathBuf>,
    /// Extra command-line flags.
    pub launch_args: Vec<String>,
    /// Maximum concurrently open tabs.
    pub max_pages: usize,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chromium_path: None,
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(|s| s.to_string()).collect(),
            max_pages: 4,
        }
    }
}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub target_url: Url,
    pub host: String,
    pub port: u16,
    pub selectors: PageSelectors,
    pub timeouts: Timeouts,
    pub browser: BrowserSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: Url::parse(DEFAULT_TARGET_URL).expect("default target URL is valid"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            selectors: PageSelectors::default(),
            timeouts: Timeouts::default(),
            browser: BrowserSettings::default(),
        }
    }
}

/// Values supplied on the command line. `None` defers to the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub chromium_path: Option<PathBuf>,
    pub max_pages: Option<usize>,
}

impl Config {
    /// Resolve configuration from CLI overrides and the process environment.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary environment lookup.
    pub fn resolve_with<F>(overrides: &Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = overrides.url.clone().or_else(|| env("NBC_URL")) {
            config.target_url = parse_target_url(&url)?;
        }
        if let Some(host) = overrides.host.clone().or_else(|| env("HOST")) {
            config.host = host;
        }
        if let Some(port) = overrides.port {
            config.port = port;
        } else if let Some(port) = env("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT: {port:?}"))?;
        }

        config.browser.chromium_path = overrides
            .chromium_path
            .clone()
            .or_else(|| env("NBC_CHROMIUM_PATH").map(PathBuf::from));

        if let Some(n) = overrides.max_pages {
            config.browser.max_pages = n;
        } else if let Some(n) = env("NBC_MAX_PAGES") {
            config.browser.max_pages = n
                .trim()
                .parse()
                .with_context(|| format!("invalid NBC_MAX_PAGES: {n:?}"))?;
        }
        if config.browser.max_pages == 0 {
            bail!("max pages must be at least 1");
        }

        if let Some(ms) = env_millis(&env, "NBC_NAV_TIMEOUT_MS")? {
            config.timeouts.navigation = ms;
        }
        if let Some(ms) = env_millis(&env, "NBC_SETTLE_TIMEOUT_MS")? {
            config.timeouts.settle = ms;
        }
        if let Some(ms) = env_millis(&env, "NBC_GRACE_MS")? {
            config.timeouts.grace = ms;
        }

        Ok(config)
    }

    /// Socket address the HTTP server binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid target URL: {raw:?}"))?;
    match url.scheme() {
        "http" | "https" | "file" | "data" => Ok(url),
        other => bail!("unsupported target URL scheme: {other}"),
    }
}

fn env_millis<F>(env: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("invalid {key}: {v:?}"))
        })
        .transpose()
}
