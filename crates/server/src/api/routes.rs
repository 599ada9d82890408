use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, playlists};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/stats", get(handlers::get_stats))
        .route("/playlists/resolve", post(playlists::resolve))
        .route("/library/low-rated", get(playlists::low_rated))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
