//! Types for the playlist resolver.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics;
use crate::subsonic::CatalogError;

/// A recommended song, as produced by an external recommender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

impl Candidate {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// A candidate with an empty artist or title carries nothing to match on.
    pub fn is_valid(&self) -> bool {
        !self.artist.trim().is_empty() && !self.title.trim().is_empty()
    }
}

/// Errors that abort a whole resolve batch.
///
/// Per-candidate remote flakiness is swallowed and counted; this type is
/// for failures of the batch itself (playlist creation, internal bugs).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Internal resolver error: {0}")]
    Internal(String),
}

/// Run-wide counters, shared by every resolver working in one process run.
#[derive(Debug, Default)]
pub struct RunStats {
    playlists_created: AtomicU64,
    songs_found: AtomicU64,
    songs_downloaded: AtomicU64,
    songs_failed: AtomicU64,
    songs_skipped_low_rating: AtomicU64,
    songs_skipped_duplicate: AtomicU64,
    duplicates_prevented: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_playlist_created(&self) {
        self.playlists_created.fetch_add(1, Ordering::Relaxed);
        metrics::PLAYLISTS_CREATED.inc();
    }

    pub fn record_found(&self) {
        self.songs_found.fetch_add(1, Ordering::Relaxed);
        metrics::RESOLVE_OUTCOMES.with_label_values(&["found"]).inc();
    }

    pub fn record_downloaded(&self) {
        self.songs_downloaded.fetch_add(1, Ordering::Relaxed);
        metrics::RESOLVE_OUTCOMES
            .with_label_values(&["downloaded"])
            .inc();
    }

    pub fn record_failed(&self) {
        self.record_failed_n(1);
    }

    pub fn record_failed_n(&self, n: u64) {
        self.songs_failed.fetch_add(n, Ordering::Relaxed);
        metrics::RESOLVE_OUTCOMES
            .with_label_values(&["failed"])
            .inc_by(n);
    }

    pub fn record_skipped_low_rating(&self) {
        self.songs_skipped_low_rating.fetch_add(1, Ordering::Relaxed);
        metrics::RESOLVE_OUTCOMES
            .with_label_values(&["skipped_low_rating"])
            .inc();
    }

    pub fn record_skipped_duplicate(&self) {
        self.songs_skipped_duplicate.fetch_add(1, Ordering::Relaxed);
        metrics::RESOLVE_OUTCOMES
            .with_label_values(&["skipped_duplicate"])
            .inc();
    }

    pub fn record_duplicate_prevented(&self) {
        self.duplicates_prevented.fetch_add(1, Ordering::Relaxed);
        metrics::DUPLICATES_PREVENTED.inc();
    }

    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            playlists_created: self.playlists_created.load(Ordering::Relaxed),
            songs_found: self.songs_found.load(Ordering::Relaxed),
            songs_downloaded: self.songs_downloaded.load(Ordering::Relaxed),
            songs_failed: self.songs_failed.load(Ordering::Relaxed),
            songs_skipped_low_rating: self.songs_skipped_low_rating.load(Ordering::Relaxed),
            songs_skipped_duplicate: self.songs_skipped_duplicate.load(Ordering::Relaxed),
            duplicates_prevented: self.duplicates_prevented.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`RunStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatsSnapshot {
    pub playlists_created: u64,
    pub songs_found: u64,
    pub songs_downloaded: u64,
    pub songs_failed: u64,
    pub songs_skipped_low_rating: u64,
    pub songs_skipped_duplicate: u64,
    pub duplicates_prevented: u64,
}
