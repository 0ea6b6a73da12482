//! Chromium-based renderer using chromiumoxide.

use super::{sanitize_js_string, NavigationResult, RenderContext, Renderer};
use crate::config::BrowserSettings;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. NBC_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("NBC_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
///
/// One browser process serves every request; each request gets its own tab.
/// At most `max_pages` tabs are open at once, further requests wait.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    pages: Arc<Semaphore>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn new(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = settings
            .chromium_path
            .clone()
            .or_else(find_chromium)
            .context("Chromium not found. Set NBC_CHROMIUM_PATH or pass --chromium.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&chrome_path)
            .arg("--headless=new");
        for arg in &settings.launch_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .with_context(|| format!("failed to launch Chromium at {}", chrome_path.display()))?;

        // Drive the CDP connection
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("chromium handler event error: {e}");
                }
            }
        });

        tracing::info!(path = %chrome_path.display(), max_pages = settings.max_pages, "Chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            pages: Arc::new(Semaphore::new(settings.max_pages)),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let permit = Arc::clone(&self.pages)
            .acquire_owned()
            .await
            .context("browser is shutting down")?;

        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
            _permit: permit,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.pages.close();
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("failed to close Chromium cleanly: {e}");
        }
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        // Page.navigate returns once the navigation commits; subresources
        // and load events are not awaited here.
        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.execute(NavigateParams::new(url)),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(response)) => {
                if let Some(error_text) = &response.result.error_text {
                    bail!("navigation failed: {error_text}");
                }
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("element not found: {selector}"))?
            .click()
            .await
            .with_context(|| format!("failed to click {selector}"))?;
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("element not found: {selector}"))?;
        element.click().await.context("failed to click input")?;
        element.focus().await.context("failed to focus input")?;

        let select_all = format!(
            "(() => {{ const el = document.querySelector('{}'); if (el && el.select) el.select(); }})()",
            sanitize_js_string(selector)
        );
        self.page
            .evaluate(select_all)
            .await
            .context("failed to select input text")?;

        element
            .type_str(text)
            .await
            .with_context(|| format!("failed to type into {selector}"))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.active_count.fetch_sub(1, Ordering::Relaxed);
        this.page.close().await.context("failed to close page")?;
        Ok(())
    }
}
