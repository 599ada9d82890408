//! The playlist resolver.
//!
//! Resolution runs in three phases per playlist batch, not per candidate,
//! so one expensive library rescan covers the whole fetch batch:
//! 1. Library: match every candidate against the catalog.
//! 2. Acquisition: fire fetch requests for the misses, then one rescan.
//! 3. Re-check: match the fetched subset again; a second miss is final.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::fetcher::TrackFetcher;
use crate::matching::{MatchOutcome, TrackMatcher};
use crate::metrics;
use crate::ratings::{LOW_RATING_MAX, LOW_RATING_MIN};
use crate::retry::{retry_with_backoff, DEFAULT_INITIAL_DELAY, DEFAULT_RETRIES};
use crate::subsonic::{Catalog, CatalogError};

use super::dedup::DedupSet;
use super::types::{Candidate, ResolveError, RunStats};

/// What the library phase concluded for one candidate.
enum LibraryLookup {
    /// Matched an existing track (possibly a near-duplicate spelling).
    Found { track_id: String, near_duplicate: bool },
    /// Definitely absent; a fetch is warranted.
    Missing,
}

/// Resolves recommendation batches into playlists of library track ids.
pub struct PlaylistResolver {
    catalog: Arc<dyn Catalog>,
    fetcher: Arc<dyn TrackFetcher>,
    matcher: TrackMatcher,
    seen: DedupSet,
    stats: Arc<RunStats>,
    config: ResolverConfig,
}

impl PlaylistResolver {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        fetcher: Arc<dyn TrackFetcher>,
        matcher: TrackMatcher,
        seen: DedupSet,
        stats: Arc<RunStats>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            matcher,
            seen,
            stats,
            config,
        }
    }

    /// Run-wide counters shared with other resolvers of this run.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Resolve candidates into library track ids, bounded by `max_songs`.
    ///
    /// The returned list holds all library hits in candidate order followed
    /// by all fetched hits in fetch-queue order. Downstream playlist
    /// composition depends on that exact ordering.
    pub async fn resolve_playlist(
        &self,
        playlist: &str,
        candidates: &[Candidate],
        max_songs: usize,
        dry_run: bool,
    ) -> Result<Vec<String>, ResolveError> {
        let total = candidates.len().min(max_songs);
        info!(
            "Processing playlist '{}': {} songs to check",
            playlist, total
        );

        let mut track_ids: Vec<String> = Vec::new();
        let mut fetch_queue: Vec<(String, String)> = Vec::new();

        // Phase 1: check the library, queueing the misses.
        for (idx, candidate) in candidates.iter().take(max_songs).enumerate() {
            if !candidate.is_valid() {
                debug!("Skipping invalid candidate at position {}", idx);
                continue;
            }
            let artist = candidate.artist.trim();
            let title = candidate.title.trim();

            if !self.seen.insert(artist, title) {
                debug!("Skipping duplicate: {} - {}", artist, title);
                self.stats.record_skipped_duplicate();
                continue;
            }

            let position = idx + 1;
            if position % 10 == 0 || position == 1 || position == total {
                info!("  [{}] Checking library: {}/{}", playlist, position, total);
            }

            match self.check_library(artist, title).await {
                Ok(LibraryLookup::Found {
                    track_id,
                    near_duplicate,
                }) => match self.passes_rating_check(&track_id).await {
                    Ok(true) => {
                        if near_duplicate {
                            info!("Using similar song from library: {} - {}", artist, title);
                            self.stats.record_duplicate_prevented();
                        } else {
                            info!("Using library version: {} - {}", artist, title);
                        }
                        self.stats.record_found();
                        track_ids.push(track_id);
                    }
                    Ok(false) => {
                        debug!("Skipping low-rated: {} - {}", artist, title);
                        self.stats.record_skipped_low_rating();
                    }
                    Err(e) => {
                        warn!("Rating check failed for {} - {}: {}", artist, title, e);
                        self.stats.record_failed();
                    }
                },
                Ok(LibraryLookup::Missing) => {
                    info!("Not in library, queueing fetch: {} - {}", artist, title);
                    fetch_queue.push((artist.to_string(), title.to_string()));
                }
                Err(e) => {
                    warn!("Library check failed for {} - {}: {}", artist, title, e);
                    self.stats.record_failed();
                }
            }
        }

        if fetch_queue.is_empty() {
            info!(
                "  [{}] Complete: {}/{} songs resolved",
                playlist,
                track_ids.len(),
                total
            );
            return Ok(track_ids);
        }

        if dry_run {
            info!(
                "  [{}] [DRY RUN] Would fetch {} songs",
                playlist,
                fetch_queue.len()
            );
            return Ok(track_ids);
        }

        // Phase 2: fire all fetch requests, then one rescan for the batch.
        info!(
            "  [{}] Fetching {} missing songs in batch...",
            playlist,
            fetch_queue.len()
        );

        let mut accepted = 0usize;
        for (idx, (artist, title)) in fetch_queue.iter().enumerate() {
            let position = idx + 1;
            if position % 5 == 0 || position == 1 || position == fetch_queue.len() {
                info!(
                    "  [{}] Fetch progress: {}/{}",
                    playlist,
                    position,
                    fetch_queue.len()
                );
            }

            match self.fetcher.request(artist, title).await {
                Ok(receipt) => {
                    debug!(
                        "Fetch accepted for {} - {} (ref {})",
                        artist, title, receipt.reference
                    );
                    metrics::FETCH_REQUESTS.with_label_values(&["accepted"]).inc();
                    accepted += 1;
                }
                Err(e) => {
                    warn!("Fetch request failed for {} - {}: {}", artist, title, e);
                    metrics::FETCH_REQUESTS.with_label_values(&["rejected"]).inc();
                }
            }
        }

        if accepted == 0 {
            warn!(
                "  [{}] All {} fetch requests failed",
                playlist,
                fetch_queue.len()
            );
            self.stats.record_failed_n(fetch_queue.len() as u64);
            return Ok(track_ids);
        }

        // Settle time scales with batch size; one slow fetch shouldn't
        // stretch the wait past 5x.
        let settle = Duration::from_secs(self.config.download_delay_secs * accepted.min(5) as u64);
        info!(
            "  [{}] Waiting {}s for fetches to settle...",
            playlist,
            settle.as_secs()
        );
        tokio::time::sleep(settle).await;

        info!("  [{}] Triggering library scan...", playlist);
        metrics::LIBRARY_RESCANS.inc();
        if let Err(e) = self.catalog.start_scan().await {
            warn!("  [{}] Scan trigger failed: {}", playlist, e);
        }
        let confirmed = self
            .catalog
            .wait_for_scan(Duration::from_secs(self.config.scan_timeout_secs))
            .await
            .unwrap_or(false);
        if !confirmed {
            warn!(
                "  [{}] Scan not confirmed within {}s, proceeding anyway",
                playlist, self.config.scan_timeout_secs
            );
        }
        tokio::time::sleep(Duration::from_secs(self.config.post_scan_delay_secs)).await;

        // Phase 3: the fetched subset gets exactly one re-check.
        info!("  [{}] Checking for fetched songs...", playlist);
        for (artist, title) in &fetch_queue {
            match self.resolve_with_retry(artist, title).await {
                Ok(MatchOutcome::Match { track_id }) => {
                    match self.passes_rating_check(&track_id).await {
                        Ok(true) => {
                            self.stats.record_downloaded();
                            track_ids.push(track_id);
                        }
                        Ok(false) => {
                            debug!("Skipping low-rated: {} - {}", artist, title);
                            self.stats.record_skipped_low_rating();
                        }
                        Err(e) => {
                            warn!("Rating check failed for {} - {}: {}", artist, title, e);
                            self.stats.record_failed();
                        }
                    }
                }
                Ok(MatchOutcome::NoMatch) => {
                    debug!("Fetched song not in library yet: {} - {}", artist, title);
                    self.stats.record_failed();
                }
                Err(e) => {
                    warn!("Re-check failed for {} - {}: {}", artist, title, e);
                    self.stats.record_failed();
                }
            }
        }

        info!(
            "  [{}] Complete: {}/{} songs resolved",
            playlist,
            track_ids.len(),
            total
        );
        Ok(track_ids)
    }

    /// Resolve and create the playlist on the catalog server.
    ///
    /// Returns true when a playlist was created. Dry-run resolves nothing
    /// beyond logging the batch size.
    pub async fn create_playlist(
        &self,
        playlist: &str,
        candidates: &[Candidate],
        max_songs: usize,
        dry_run: bool,
    ) -> Result<bool, ResolveError> {
        info!("Creating playlist: {}", playlist);

        if dry_run {
            info!(
                "[DRY RUN] Would process {} recommendations",
                candidates.len()
            );
            return Ok(false);
        }

        let track_ids = self
            .resolve_playlist(playlist, candidates, max_songs, false)
            .await?;

        if track_ids.is_empty() {
            warn!("No songs resolved for playlist '{}'", playlist);
            return Ok(false);
        }

        self.catalog.create_playlist(playlist, &track_ids).await?;
        self.stats.record_playlist_created();
        info!("Created playlist: {} ({} songs)", playlist, track_ids.len());
        Ok(true)
    }

    /// Library phase for one candidate: full match first, then the
    /// near-duplicate guard.
    async fn check_library(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<LibraryLookup, CatalogError> {
        debug!("Checking library for: {} - {}", artist, title);
        if let MatchOutcome::Match { track_id } = self.resolve_with_retry(artist, title).await? {
            return Ok(LibraryLookup::Found {
                track_id,
                near_duplicate: false,
            });
        }

        debug!("Checking for similar songs: {} - {}", artist, title);
        let similar = retry_with_backoff(
            DEFAULT_RETRIES,
            DEFAULT_INITIAL_DELAY,
            CatalogError::is_transient,
            || self.matcher.find_similar(self.catalog.as_ref(), artist, title),
        )
        .await?;

        match similar {
            Some(track_id) => Ok(LibraryLookup::Found {
                track_id,
                near_duplicate: true,
            }),
            None => Ok(LibraryLookup::Missing),
        }
    }

    async fn resolve_with_retry(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<MatchOutcome, CatalogError> {
        retry_with_backoff(
            DEFAULT_RETRIES,
            DEFAULT_INITIAL_DELAY,
            CatalogError::is_transient,
            || self.matcher.resolve(self.catalog.as_ref(), artist, title),
        )
        .await
    }

    /// Live rating check on an accepted match; false means "exclude".
    ///
    /// Always a live lookup rather than the cache, so a track rated down
    /// after the last scan is still excluded.
    async fn passes_rating_check(&self, track_id: &str) -> Result<bool, CatalogError> {
        let rating = retry_with_backoff(
            DEFAULT_RETRIES,
            DEFAULT_INITIAL_DELAY,
            CatalogError::is_transient,
            || self.catalog.song_rating(track_id),
        )
        .await?;

        Ok(!(LOW_RATING_MIN..=LOW_RATING_MAX).contains(&rating))
    }
}
