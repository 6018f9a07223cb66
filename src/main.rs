// =============================================================================
// Trendwatch - Main Entry Point
// =============================================================================
//
// Backend for the trend dashboard: fetches daily bars per watchlist
// instrument on demand and serves the derived chart payloads over REST.
// There is no background work; every watchlist request recomputes from a
// fresh fetch.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod indicators;
mod market_data;
mod runtime_config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Trendwatch backend starting up");

    let mut config = RuntimeConfig::load("watchlist_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Narrow the watchlist from env if requested.
    if let Ok(names) = std::env::var("TRENDWATCH_SYMBOLS") {
        let wanted: Vec<String> = names
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !wanted.is_empty() {
            config.instruments.retain(|i| wanted.contains(&i.name));
        }
    }
    if config.instruments.is_empty() {
        anyhow::bail!("no instruments configured");
    }

    info!(
        instruments = config.instruments.len(),
        bar_count = config.bar_count,
        concurrency = config.fetch_concurrency,
        "Watchlist configured"
    );

    let api_key = std::env::var("TWELVEDATA_KEY").unwrap_or_default();
    if api_key.is_empty() {
        warn!("TWELVEDATA_KEY is not set - provider requests will be rejected");
    }

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, api_key));

    // ── 3. Serve the API ─────────────────────────────────────────────────
    let bind_addr =
        std::env::var("TRENDWATCH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received - stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Trendwatch shut down complete.");
    Ok(())
}
