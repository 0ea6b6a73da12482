//! HTTP surface.
//!
//! A thin wrapper: read the date, call the pipeline, serialize. Every
//! pipeline failure becomes a 500 with `{ "error": <message> }`.

use crate::pipeline::{pad_date, today_utc, RatePipeline};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nbc_rates::RateEntry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// Liveness message served at `/`.
pub const LIVENESS_MESSAGE: &str = "NBC converter API is running. Try /nbcRate?date=YYYY-MM-DD";

/// Shared handler state.
pub struct AppState {
    pub pipeline: RatePipeline,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: RatePipeline) -> Self {
        Self {
            pipeline,
            started_at: Instant::now(),
        }
    }
}

/// Successful `/nbcRate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesResponse {
    pub source: String,
    pub date: String,
    pub rates: Vec<RateEntry>,
}

/// Failed `/nbcRate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `/nbcRate` query string.
#[derive(Debug, Deserialize, Default)]
pub struct RateParams {
    pub date: Option<String>,
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/nbcRate", get(nbc_rate))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("NBC converter API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolve the requested date: default to today (UTC), pad to ten chars.
pub fn requested_date(params: &RateParams) -> String {
    match params.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => pad_date(date),
        _ => today_utc(),
    }
}

// ── Handlers ────────────────────────────────────────────────────

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let renderer = state.pipeline.renderer();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs_f64(),
        "chromium_available": renderer.is_available(),
        "active_contexts": renderer.active_contexts(),
    }))
}

async fn nbc_rate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RateParams>,
) -> Response {
    let date = requested_date(&params);

    match state.pipeline.fetch(&date).await {
        Ok(set) => Json(RatesResponse {
            source: "live".to_string(),
            date,
            rates: set.entries,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(%date, "NBC converter error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
