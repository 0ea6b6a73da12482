//! `nbc-rates serve`: run the HTTP API.

use super::launch_renderer;
use crate::config::Config;
use crate::pipeline::RatePipeline;
use crate::rest::{self, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Start the server and block until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let addr = config.listen_addr()?;
    let config = Arc::new(config);
    info!(
        "starting nbc-rates v{} for {}",
        env!("CARGO_PKG_VERSION"),
        config.target_url
    );

    let renderer = launch_renderer(&config).await;
    let pipeline = RatePipeline::new(Arc::clone(&config), Arc::clone(&renderer));
    let state = Arc::new(AppState::new(pipeline));

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
    };

    let result = rest::serve(addr, state, shutdown).await;

    renderer.shutdown().await?;
    info!("stopped");
    result
}
