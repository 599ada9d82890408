use std::sync::Arc;

use chrono::{DateTime, Utc};

use cadenza_core::{
    Catalog, Config, DedupSet, PlaylistResolver, RatingScanner, RunStats, SanitizedConfig,
    TrackFetcher, TrackMatcher,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn Catalog>,
    fetcher: Arc<dyn TrackFetcher>,
    scanner: Arc<RatingScanner>,
    stats: Arc<RunStats>,
    seen: DedupSet,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn Catalog>,
        fetcher: Arc<dyn TrackFetcher>,
        scanner: Arc<RatingScanner>,
    ) -> Self {
        Self {
            config,
            catalog,
            fetcher,
            scanner,
            stats: Arc::new(RunStats::new()),
            seen: DedupSet::new(),
            started_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn scanner(&self) -> &RatingScanner {
        &self.scanner
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Build a resolver sharing this process's run state (dedup set and
    /// counters), so candidates repeated across playlists are handled once.
    pub fn resolver(&self) -> PlaylistResolver {
        PlaylistResolver::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.fetcher),
            TrackMatcher::new(),
            self.seen.clone(),
            Arc::clone(&self.stats),
            self.config.resolver.clone(),
        )
    }
}
