//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide).

pub mod chromium;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of opening a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The URL the tab ended up on.
    pub final_url: String,
    /// Time taken until the navigation committed, in milliseconds.
    pub load_time_ms: u64,
}

/// Window property holding the token set by [`RenderContext::mark_document`].
pub const SUBMIT_MARKER: &str = "__nbcSubmit";

/// Snapshot of page state used to detect quiescence.
///
/// Two equal consecutive probes mean nothing visible changed in between:
/// no navigation, no new network resources, no table content changing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProbe {
    pub url: String,
    pub ready_state: String,
    /// Resource timing entries recorded so far.
    pub resources: u64,
    pub has_table: bool,
    /// Token left by `mark_document`; a fresh document has none.
    #[serde(default)]
    pub marker: Option<String>,
    /// Hash of the text of every matching table.
    #[serde(default)]
    pub tables_digest: u64,
}

impl LoadProbe {
    /// DOMContentLoaded has fired.
    pub fn dom_ready(&self) -> bool {
        self.ready_state == "interactive" || self.ready_state == "complete"
    }
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab), owned by the caller.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
    /// Whether a real browser backs this renderer.
    fn is_available(&self) -> bool {
        true
    }
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Start navigating to a URL; returns once the navigation commits.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;
    /// Focus the element, select its contents, and type `text` one
    /// character at a time.
    async fn type_into(&self, selector: &str, text: &str) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Whether an element matches `selector` right now.
    async fn selector_exists(&self, selector: &str) -> Result<bool> {
        let script = format!(
            "!!document.querySelector('{}')",
            sanitize_js_string(selector)
        );
        let value = self.execute_js(&script).await?;
        value
            .as_bool()
            .ok_or_else(|| anyhow!("unexpected selector probe result: {value}"))
    }

    /// Assign `value` directly and fire `input` and `change` so the page's
    /// own handlers run. Returns `false` when the element is missing.
    async fn set_value_and_notify(&self, selector: &str, value: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (!el) return false;
                el.focus();
                el.value = '{}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sanitize_js_string(selector),
            sanitize_js_string(value)
        );
        let result = self.execute_js(&script).await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    /// Tag the current document with `token`. A navigation replaces the
    /// window and drops the tag.
    async fn mark_document(&self, token: &str) -> Result<()> {
        let script = format!(
            "window.{SUBMIT_MARKER} = '{}'; true",
            sanitize_js_string(token)
        );
        self.execute_js(&script).await?;
        Ok(())
    }

    /// Take a [`LoadProbe`], using `table_selector` for `has_table` and
    /// `tables_digest`.
    async fn probe(&self, table_selector: &str) -> Result<LoadProbe> {
        let script = format!(
            r#"(() => {{
                const tables = document.querySelectorAll('{}');
                let digest = 0;
                for (const t of tables) {{
                    const text = t.textContent || '';
                    for (let i = 0; i < text.length; i++) {{
                        digest = (Math.imul(digest, 31) + text.charCodeAt(i)) >>> 0;
                    }}
                }}
                const marker = window.{SUBMIT_MARKER};
                return {{
                    url: location.href,
                    readyState: document.readyState,
                    resources: performance.getEntriesByType('resource').length,
                    hasTable: tables.length > 0,
                    marker: marker === undefined ? null : String(marker),
                    tablesDigest: digest
                }};
            }})()"#,
            sanitize_js_string(table_selector)
        );
        let value = self.execute_js(&script).await?;
        serde_json::from_value(value).map_err(|e| anyhow!("malformed load probe: {e}"))
    }
}

/// A no-op renderer used when Chromium is unavailable.
///
/// The liveness routes keep working; every rate request fails.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow!("browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
    fn is_available(&self) -> bool {
        false
    }
}

/// Escape a value for use inside a single- or double-quoted JS string
/// literal.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
