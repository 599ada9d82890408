//! Subsonic-protocol fetch service client.
//!
//! The fetch service masquerades as a Subsonic server: searching it returns
//! tracks it can obtain, and touching a track's stream endpoint enqueues the
//! actual download.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::{FetcherConfig, SubsonicConfig};
use crate::subsonic::{auth_params, Envelope};

use super::types::{FetchError, FetchReceipt, TrackFetcher};

/// Timeout for the stream-warmup request; one chunk is all we need.
const STREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a Subsonic-compatible fetch service.
pub struct SubsonicFetcher {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl SubsonicFetcher {
    /// Create a new fetcher. Credentials are shared with the catalog server.
    pub fn new(config: &FetcherConfig, subsonic: &SubsonicConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: subsonic.username.clone(),
            password: subsonic.password.clone(),
        }
    }

    fn classify(e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::ConnectionFailed(e.to_string())
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, FetchError> {
        let mut params = auth_params(&self.username, &self.password);
        params.push(("query".to_string(), query.to_string()));
        params.push(("songCount".to_string(), "5".to_string()));

        let url = format!("{}/rest/search3", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FetchError::Api {
                code: status.as_u16() as i64,
                message: status.to_string(),
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let body = envelope.response;
        if body.status == "failed" {
            let (code, message) = body
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, "unknown error".to_string()));
            return Err(FetchError::Api { code, message });
        }

        Ok(body
            .search_result3
            .unwrap_or_default()
            .song
            .into_iter()
            .map(|song| song.id)
            .collect())
    }

    /// Touch the stream endpoint to enqueue the download; the first body
    /// chunk is enough to register the request.
    async fn warm_stream(&self, song_id: &str) -> Result<(), FetchError> {
        let mut params = auth_params(&self.username, &self.password);
        params.push(("id".to_string(), song_id.to_string()));

        let url = format!("{}/rest/stream", self.base_url);
        let mut response = self
            .client
            .get(&url)
            .query(&params)
            .timeout(STREAM_TIMEOUT)
            .send()
            .await
            .map_err(Self::classify)?;

        let _ = response.chunk().await.map_err(Self::classify)?;
        Ok(())
    }
}

#[async_trait]
impl TrackFetcher for SubsonicFetcher {
    fn name(&self) -> &str {
        "subsonic-fetch"
    }

    async fn request(&self, artist: &str, title: &str) -> Result<FetchReceipt, FetchError> {
        debug!("Requesting fetch: {} - {}", artist, title);

        let song_ids = self.search(&format!("{artist} {title}")).await?;
        let Some(song_id) = song_ids.into_iter().next() else {
            return Err(FetchError::NotFound);
        };

        self.warm_stream(&song_id).await?;
        debug!("Fetch queued for {} - {} ({})", artist, title, song_id);

        Ok(FetchReceipt { reference: song_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_fetcher() -> SubsonicFetcher {
        SubsonicFetcher::new(
            &FetcherConfig {
                url: "http://127.0.0.1:1/".to_string(),
                timeout_secs: 2,
            },
            &SubsonicConfig {
                url: "http://localhost:4533".to_string(),
                username: "admin".to_string(),
                password: "secret".to_string(),
                timeout_secs: 2,
            },
        )
    }

    #[test]
    fn test_trailing_slash_stripped() {
        assert_eq!(test_fetcher().base_url, "http://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connection_error() {
        let err = test_fetcher().request("Artist", "Track").await.unwrap_err();
        assert!(
            matches!(err, FetchError::ConnectionFailed(_) | FetchError::Timeout),
            "got {err:?}"
        );
    }
}
