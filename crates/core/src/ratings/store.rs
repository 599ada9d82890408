//! Rating store abstraction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cached track rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedTrack {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub rating: u32,
}

/// Errors from the rating store.
#[derive(Debug, Error)]
pub enum RatingStoreError {
    #[error("Rating store database error: {0}")]
    Database(String),
}

/// Persistent track-id keyed rating storage plus the scan-date marker.
///
/// Implementations must make each upsert atomic: a reader never observes a
/// half-written row. No cross-row transaction is required, entries are
/// independent.
pub trait RatingStore: Send + Sync {
    /// Date (YYYY-MM-DD) of the last completed full scan, if any.
    fn last_scan_date(&self) -> Result<Option<String>, RatingStoreError>;

    /// Record a completed full scan. Call only after every per-track write
    /// of the scan has landed.
    fn set_last_scan_date(&self, date: &str) -> Result<(), RatingStoreError>;

    /// Insert or replace one track's rating. Last write wins.
    fn upsert(
        &self,
        track_id: &str,
        artist: &str,
        title: &str,
        rating: u32,
    ) -> Result<(), RatingStoreError>;

    /// All cached tracks with `min <= rating <= max`. Ordering unspecified.
    fn tracks_rated_between(&self, min: u32, max: u32)
        -> Result<Vec<RatedTrack>, RatingStoreError>;

    /// Drop all cached ratings (admin escape hatch).
    fn clear(&self) -> Result<(), RatingStoreError>;
}
