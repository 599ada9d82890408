use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use cadenza_core::{Candidate, RatedTrack, RunStatsSnapshot};

use crate::metrics::HTTP_REQUESTS_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// Target playlist name.
    pub playlist: String,
    /// Recommendations to reconcile, in order.
    pub candidates: Vec<Candidate>,
    /// Cap on accepted songs; defaults to the configured maximum.
    #[serde(default)]
    pub max_songs: Option<usize>,
    /// Override the configured dry-run flag for this request.
    #[serde(default)]
    pub dry_run: Option<bool>,
    /// Also create/replace the playlist on the catalog server.
    #[serde(default)]
    pub create: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub playlist: String,
    pub track_ids: Vec<String>,
    pub created: bool,
    pub stats: RunStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Resolve a batch of recommendations into library track ids, optionally
/// creating the playlist.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.playlist.trim().is_empty() {
        return Err(bad_request("playlist name is empty"));
    }
    if request.candidates.is_empty() {
        return Err(bad_request("candidates list is empty"));
    }

    let config = state.config();
    let max_songs = request.max_songs.unwrap_or(config.resolver.max_songs);
    let dry_run = request.dry_run.unwrap_or(config.resolver.dry_run);

    let resolver = state.resolver();
    let track_ids = resolver
        .resolve_playlist(&request.playlist, &request.candidates, max_songs, dry_run)
        .await
        .map_err(|e| {
            error!("Resolve failed for '{}': {}", request.playlist, e);
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["POST", "/playlists/resolve", "502"])
                .inc();
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;

    let mut created = false;
    if request.create && !dry_run && !track_ids.is_empty() {
        state
            .catalog()
            .create_playlist(&request.playlist, &track_ids)
            .await
            .map_err(|e| {
                error!("Playlist creation failed for '{}': {}", request.playlist, e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
            })?;
        state.stats().record_playlist_created();
        created = true;
    }

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/playlists/resolve", "200"])
        .inc();

    Ok(Json(ResolveResponse {
        playlist: request.playlist,
        track_ids,
        created,
        stats: state.stats().snapshot(),
    }))
}

/// The low-rated track set backing the exclusion policy, refreshing the
/// daily cache if needed. Recommenders use this as their avoid-list.
pub async fn low_rated(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RatedTrack>>, (StatusCode, Json<ErrorResponse>)> {
    let tracks = state.scanner().low_rated_tracks().await.map_err(|e| {
        error!("Rating scan failed: {}", e);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    Ok(Json(tracks))
}
