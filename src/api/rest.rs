// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public: the dashboard is a
// read-only surface with no trading controls behind it.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::analysis::pipeline;
use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/watchlist", get(watchlist))
        .route("/api/v1/instruments", get(instruments))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_s: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_s: state.uptime_secs(),
    };
    Json(resp)
}

// =============================================================================
// Watchlist
// =============================================================================

#[derive(Deserialize)]
struct WatchlistQuery {
    #[serde(default)]
    page: Option<u32>,
}

/// The batch endpoint: one row per configured instrument of the requested
/// page (all pages when `page` is absent), freshly fetched and analysed.
async fn watchlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WatchlistQuery>,
) -> impl IntoResponse {
    let report = pipeline::run_batch(&state, query.page).await;
    Json(report)
}

// =============================================================================
// Instruments
// =============================================================================

async fn instruments(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let instruments = state.runtime_config.read().instruments.clone();
    Json(instruments)
}
