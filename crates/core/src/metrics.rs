//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Playlist resolution (per-candidate outcomes, match confidence)
//! - Acquisition (fetch requests, library rescans)
//! - The daily rating scan

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

/// Per-candidate resolution outcomes.
pub static RESOLVE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cadenza_resolve_outcomes_total",
            "Candidate resolution outcomes",
        ),
        // "found", "downloaded", "failed", "skipped_duplicate", "skipped_low_rating"
        &["outcome"],
    )
    .unwrap()
});

/// Near-duplicates reused instead of fetched.
pub static DUPLICATES_PREVENTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cadenza_duplicates_prevented_total",
        "Near-duplicate library tracks reused instead of fetched",
    )
    .unwrap()
});

/// Best match confidence scores.
pub static MATCH_SCORE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cadenza_match_score",
            "Distribution of best library match scores",
        )
        .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.75, 0.8, 0.9, 0.95, 1.0]),
    )
    .unwrap()
});

/// Fetch requests by result.
pub static FETCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cadenza_fetch_requests_total", "Track fetch requests"),
        &["result"], // "accepted", "rejected"
    )
    .unwrap()
});

/// Library rescans triggered after fetch batches.
pub static LIBRARY_RESCANS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cadenza_library_rescans_total",
        "Library rescans triggered after fetch batches",
    )
    .unwrap()
});

/// Playlists created on the catalog server.
pub static PLAYLISTS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("cadenza_playlists_created_total", "Playlists created").unwrap()
});

/// Duration of full-library rating scans.
pub static RATING_SCAN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cadenza_rating_scan_duration_seconds",
            "Duration of full-library rating scans",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RESOLVE_OUTCOMES.clone()),
        Box::new(DUPLICATES_PREVENTED.clone()),
        Box::new(MATCH_SCORE.clone()),
        Box::new(FETCH_REQUESTS.clone()),
        Box::new(LIBRARY_RESCANS.clone()),
        Box::new(PLAYLISTS_CREATED.clone()),
        Box::new(RATING_SCAN_DURATION.clone()),
    ]
}
