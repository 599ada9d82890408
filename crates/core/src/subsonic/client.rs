//! HTTP client implementation of the `Catalog` trait.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::SubsonicConfig;

use super::auth::auth_params;
use super::types::{
    AlbumRef, Catalog, CatalogError, Envelope, LibraryTrack, PlaylistRef, ResponseBody,
};

/// How often `wait_for_scan` polls the scan status endpoint.
const SCAN_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Subsonic HTTP catalog client.
pub struct SubsonicClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl SubsonicClient {
    /// Create a new client from configuration.
    pub fn new(config: &SubsonicConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn classify(e: reqwest::Error) -> CatalogError {
        if e.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::ConnectionFailed(e.to_string())
        }
    }

    /// Issue one Subsonic API request and unwrap the response envelope.
    async fn request(
        &self,
        endpoint: &str,
        extra_params: &[(&str, String)],
    ) -> Result<ResponseBody, CatalogError> {
        let mut params = auth_params(&self.username, &self.password);
        for (key, value) in extra_params {
            params.push((key.to_string(), value.clone()));
        }

        let url = format!("{}/rest/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                code: status.as_u16() as i64,
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let body = envelope.response;
        if body.status == "failed" {
            let (code, message) = body
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, "unknown error".to_string()));
            return Err(CatalogError::Api { code, message });
        }

        Ok(body)
    }
}

#[async_trait]
impl Catalog for SubsonicClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LibraryTrack>, CatalogError> {
        let body = self
            .request(
                "search3",
                &[
                    ("query", query.to_string()),
                    ("songCount", limit.to_string()),
                ],
            )
            .await?;

        Ok(body.search_result3.unwrap_or_default().song)
    }

    async fn song_rating(&self, id: &str) -> Result<u32, CatalogError> {
        let body = self.request("getSong", &[("id", id.to_string())]).await?;
        let song = body
            .song
            .ok_or_else(|| CatalogError::InvalidResponse(format!("no song in getSong({id})")))?;
        Ok(song.rating)
    }

    async fn start_scan(&self) -> Result<(), CatalogError> {
        self.request("startScan", &[]).await?;
        Ok(())
    }

    async fn wait_for_scan(&self, ceiling: Duration) -> Result<bool, CatalogError> {
        let start = Instant::now();
        while start.elapsed() < ceiling {
            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
            match self.request("getScanStatus", &[]).await {
                Ok(body) => {
                    if !body.scan_status.map(|s| s.scanning).unwrap_or(false) {
                        return Ok(true);
                    }
                }
                // Polling failures don't end the wait, the scan may still
                // complete within the ceiling.
                Err(e) => debug!("Scan status poll failed: {}", e),
            }
        }
        Ok(false)
    }

    async fn album_page(&self, offset: u32, size: u32) -> Result<Vec<AlbumRef>, CatalogError> {
        let body = self
            .request(
                "getAlbumList2",
                &[
                    ("type", "alphabeticalByName".to_string()),
                    ("size", size.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;

        Ok(body.album_list2.unwrap_or_default().album)
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<LibraryTrack>, CatalogError> {
        let body = self
            .request("getAlbum", &[("id", album_id.to_string())])
            .await?;

        Ok(body.album.unwrap_or_default().song)
    }

    async fn playlists(&self) -> Result<Vec<PlaylistRef>, CatalogError> {
        let body = self.request("getPlaylists", &[]).await?;
        Ok(body.playlists.unwrap_or_default().playlist)
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        // Replace semantics: drop any playlist with the same name first.
        let existing = self.playlists().await?;
        if let Some(playlist) = existing.iter().find(|p| p.name == name) {
            debug!("Replacing existing playlist '{}' ({})", name, playlist.id);
            self.delete_playlist(&playlist.id).await?;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let mut params = auth_params(&self.username, &self.password);
        params.push(("name".to_string(), name.to_string()));
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        let url = format!("{}/rest/createPlaylist?{}", self.base_url, query.join("&"));

        let response = self.client.get(&url).send().await.map_err(Self::classify)?;
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        let body = envelope.response;
        if body.status != "ok" {
            let (code, message) = body
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, "createPlaylist failed".to_string()));
            return Err(CatalogError::Api { code, message });
        }

        let playlist_id = body
            .playlist
            .map(|p| p.id)
            .ok_or_else(|| CatalogError::InvalidResponse("createPlaylist returned no id".into()))?;

        for track_id in track_ids {
            if let Err(e) = self
                .request(
                    "updatePlaylist",
                    &[
                        ("playlistId", playlist_id.clone()),
                        ("songIdToAdd", track_id.clone()),
                    ],
                )
                .await
            {
                warn!("Failed to add {} to playlist '{}': {}", track_id, name, e);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        debug!("Created playlist '{}' ({} songs)", name, track_ids.len());
        Ok(())
    }

    async fn delete_playlist(&self, id: &str) -> Result<(), CatalogError> {
        self.request("deletePlaylist", &[("id", id.to_string())])
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        self.request("ping", &[]).await?;
        Ok(())
    }
}
