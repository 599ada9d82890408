use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use cadenza_core::{RunStatsSnapshot, SanitizedConfig};

use crate::metrics;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
}

/// Health probe: "healthy" while the catalog answers pings, "degraded"
/// otherwise. The service stays up either way, resolution requests will
/// just fail until the catalog returns.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = match state.catalog().ping().await {
        Ok(()) => "healthy",
        Err(_) => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: VERSION.to_string(),
        uptime_secs: (chrono::Utc::now() - state.started_at()).num_seconds(),
    })
}

pub async fn metrics() -> String {
    metrics::render()
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<RunStatsSnapshot> {
    Json(state.stats().snapshot())
}
