//! Daily full-library rating scan.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::subsonic::{Catalog, CatalogError};

use super::store::{RatedTrack, RatingStore, RatingStoreError};
use super::{LOW_RATING_MAX, LOW_RATING_MIN};

/// Errors from the rating scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Catalog error during rating scan: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Rating store error during rating scan: {0}")]
    Store(#[from] RatingStoreError),
}

/// Refreshes the rating store from the catalog, at most once per day.
pub struct RatingScanner {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn RatingStore>,
    config: ScanConfig,
}

impl RatingScanner {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn RatingStore>, config: ScanConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    /// The low-rated track set, refreshed by a full scan when stale.
    ///
    /// A scan stamped today serves straight from the store. Otherwise every
    /// album is visited with a bounded number of concurrent fetches and all
    /// rated tracks are upserted; the scan date is stamped only when every
    /// album fetch succeeded, so a partial scan never reports itself fresh.
    pub async fn low_rated_tracks(&self) -> Result<Vec<RatedTrack>, ScanError> {
        let today = Local::now().format("%Y-%m-%d").to_string();

        if self.store.last_scan_date()?.as_deref() == Some(today.as_str()) {
            info!("Using cached low-rated tracks from today's scan");
            return Ok(self
                .store
                .tracks_rated_between(LOW_RATING_MIN, LOW_RATING_MAX)?);
        }

        info!("Performing full library rating scan (cached daily)");
        let start = Instant::now();

        let album_ids = self.fetch_all_album_ids().await?;
        info!("Found {} albums to scan", album_ids.len());

        let mut failed_albums = 0usize;
        let mut rated_tracks = 0usize;

        let mut fetches = stream::iter(album_ids.into_iter().map(|album_id| {
            let catalog = Arc::clone(&self.catalog);
            async move {
                let result = catalog.album_tracks(&album_id).await;
                (album_id, result)
            }
        }))
        .buffer_unordered(self.config.workers.max(1));

        while let Some((album_id, result)) = fetches.next().await {
            match result {
                Ok(tracks) => {
                    for track in tracks {
                        if track.rating > 0 {
                            self.store
                                .upsert(&track.id, &track.artist, &track.title, track.rating)?;
                            rated_tracks += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping album {} in rating scan: {}", album_id, e);
                    failed_albums += 1;
                }
            }
        }

        if failed_albums == 0 {
            self.store.set_last_scan_date(&today)?;
        } else {
            warn!(
                "{} album fetches failed, scan will be retried next run",
                failed_albums
            );
        }

        crate::metrics::RATING_SCAN_DURATION.observe(start.elapsed().as_secs_f64());

        let low_rated = self
            .store
            .tracks_rated_between(LOW_RATING_MIN, LOW_RATING_MAX)?;
        info!(
            "Rating scan complete: {} rated tracks, {} low-rated ({}-{} stars)",
            rated_tracks,
            low_rated.len(),
            LOW_RATING_MIN,
            LOW_RATING_MAX
        );
        Ok(low_rated)
    }

    /// Page through the alphabetical album listing up to the configured cap.
    async fn fetch_all_album_ids(&self) -> Result<Vec<String>, CatalogError> {
        let mut album_ids = Vec::new();
        let mut offset = 0u32;

        while offset < self.config.max_albums {
            let page = self
                .catalog
                .album_page(offset, self.config.album_page_size)
                .await?;
            if page.is_empty() {
                break;
            }
            album_ids.extend(page.into_iter().map(|album| album.id));
            offset += self.config.album_page_size;
        }

        Ok(album_ids)
    }
}
