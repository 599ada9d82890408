//! Types for the Subsonic catalog abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A track as known to the library catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryTrack {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// User star rating, 0 (unrated) to 5.
    #[serde(default, rename = "userRating")]
    pub rating: u32,
}

/// An album reference from the catalog's album listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A playlist reference from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Errors that can occur talking to a Subsonic catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Catalog request timeout")]
    Timeout,

    #[error("Catalog API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Unexpected catalog response: {0}")]
    InvalidResponse(String),
}

impl CatalogError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Network-level failures are transient; a `status=failed` answer from
    /// the server is definitive and must not be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout)
    }
}

/// Read/search/scan/playlist operations against a Subsonic-compatible server.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Free-text search over the library (`search3`). An empty result is
    /// not an error.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LibraryTrack>, CatalogError>;

    /// Current star rating of a track (0 = unrated).
    async fn song_rating(&self, id: &str) -> Result<u32, CatalogError>;

    /// Kick off a library scan. Returns as soon as the request is accepted.
    async fn start_scan(&self) -> Result<(), CatalogError>;

    /// Poll until the scan finishes or `ceiling` elapses.
    ///
    /// `Ok(false)` means "not confirmed within the ceiling" and is a
    /// degraded outcome, not an error.
    async fn wait_for_scan(&self, ceiling: Duration) -> Result<bool, CatalogError>;

    /// One page of the alphabetical album listing.
    async fn album_page(&self, offset: u32, size: u32) -> Result<Vec<AlbumRef>, CatalogError>;

    /// All tracks of an album, with their ratings.
    async fn album_tracks(&self, album_id: &str) -> Result<Vec<LibraryTrack>, CatalogError>;

    /// All playlists on the server.
    async fn playlists(&self) -> Result<Vec<PlaylistRef>, CatalogError>;

    /// Create a playlist with the given tracks, replacing any playlist of
    /// the same name.
    async fn create_playlist(&self, name: &str, track_ids: &[String])
        -> Result<(), CatalogError>;

    /// Delete a playlist by id.
    async fn delete_playlist(&self, id: &str) -> Result<(), CatalogError>;

    /// Connection test.
    async fn ping(&self) -> Result<(), CatalogError>;
}

// Wire format ------------------------------------------------------------

/// Top-level envelope of every Subsonic JSON response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "subsonic-response")]
    pub response: ResponseBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<ApiFailure>,
    #[serde(default)]
    pub search_result3: Option<SearchResult3>,
    #[serde(default)]
    pub scan_status: Option<ScanStatus>,
    #[serde(default)]
    pub song: Option<LibraryTrack>,
    #[serde(default)]
    pub album: Option<AlbumWithSongs>,
    #[serde(default)]
    pub album_list2: Option<AlbumList2>,
    #[serde(default)]
    pub playlists: Option<PlaylistList>,
    #[serde(default)]
    pub playlist: Option<PlaylistRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiFailure {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResult3 {
    #[serde(default)]
    pub song: Vec<LibraryTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScanStatus {
    #[serde(default)]
    pub scanning: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AlbumWithSongs {
    #[serde(default)]
    pub song: Vec<LibraryTrack>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AlbumList2 {
    #[serde(default)]
    pub album: Vec<AlbumRef>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlaylistList {
    #[serde(default)]
    pub playlist: Vec<PlaylistRef>,
}
