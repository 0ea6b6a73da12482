//! `nbc-rates fetch`: fetch one date and print the JSON body.

use crate::config::Config;
use crate::pipeline::{pad_date, today_utc, RatePipeline};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::rest::RatesResponse;
use anyhow::Result;
use std::sync::Arc;

/// Run a single fetch. The response body goes to stdout.
pub async fn run(config: Config, date: Option<&str>) -> Result<()> {
    let date = date.map(pad_date).unwrap_or_else(today_utc);
    let config = Arc::new(config);

    let renderer: Arc<dyn Renderer> = Arc::new(ChromiumRenderer::new(&config.browser).await?);
    let pipeline = RatePipeline::new(Arc::clone(&config), Arc::clone(&renderer));

    let result = pipeline.fetch(&date).await;
    renderer.shutdown().await?;

    let set = result?;
    let body = RatesResponse {
        source: "live".to_string(),
        date,
        rates: set.entries,
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
