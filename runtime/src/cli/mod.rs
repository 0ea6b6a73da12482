//! CLI subcommand implementations for the `nbc-rates` binary.

pub mod doctor;
pub mod fetch;
pub mod serve;

use crate::config::Config;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer};
use std::sync::Arc;
use tracing::{info, warn};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Initialize tracing to stderr. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("  tracing already initialized: {e}");
    }
}

/// Launch Chromium, or fall back to [`NoopRenderer`] so the server still
/// answers liveness checks.
pub async fn launch_renderer(config: &Config) -> Arc<dyn Renderer> {
    match ChromiumRenderer::new(&config.browser).await {
        Ok(renderer) => {
            info!("Chromium renderer initialized");
            Arc::new(renderer)
        }
        Err(e) => {
            warn!("Failed to initialize Chromium: {e:#}");
            warn!("Rate requests will fail until a browser is available");
            Arc::new(NoopRenderer)
        }
    }
}
