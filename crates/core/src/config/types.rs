use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub subsonic: SubsonicConfig,
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Subsonic catalog server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubsonicConfig {
    /// Base URL of the catalog server (e.g., "http://localhost:4533")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Fetch service configuration.
///
/// The fetch service speaks the Subsonic protocol and shares the catalog
/// credentials; only the URL differs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Base URL of the fetch service
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (rating cache)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cadenza.db")
}

/// Playlist resolver tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Default cap on songs per playlist when a request doesn't specify one.
    #[serde(default = "default_max_songs")]
    pub max_songs: usize,
    /// Base delay after triggering fetches, scaled by accepted count (capped at 5x).
    #[serde(default = "default_download_delay")]
    pub download_delay_secs: u64,
    /// Settle time after a library scan completes.
    #[serde(default = "default_post_scan_delay")]
    pub post_scan_delay_secs: u64,
    /// Ceiling on waiting for a library scan to finish.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
    /// Log what would be fetched instead of fetching.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_songs: default_max_songs(),
            download_delay_secs: default_download_delay(),
            post_scan_delay_secs: default_post_scan_delay(),
            scan_timeout_secs: default_scan_timeout(),
            dry_run: false,
        }
    }
}

fn default_max_songs() -> usize {
    100
}

fn default_download_delay() -> u64 {
    6
}

fn default_post_scan_delay() -> u64 {
    2
}

fn default_scan_timeout() -> u64 {
    60
}

/// Full-library rating scan tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Albums fetched per catalog page.
    #[serde(default = "default_album_page_size")]
    pub album_page_size: u32,
    /// Upper bound on albums visited in one scan.
    #[serde(default = "default_max_albums")]
    pub max_albums: u32,
    /// Concurrent album fetches during the scan.
    #[serde(default = "default_scan_workers")]
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            album_page_size: default_album_page_size(),
            max_albums: default_max_albums(),
            workers: default_scan_workers(),
        }
    }
}

fn default_album_page_size() -> u32 {
    500
}

fn default_max_albums() -> u32 {
    10_000
}

fn default_scan_workers() -> usize {
    8
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub subsonic: SanitizedSubsonicConfig,
    pub fetcher: FetcherConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
    pub scan: ScanConfig,
}

/// Sanitized Subsonic config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSubsonicConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            subsonic: SanitizedSubsonicConfig {
                url: config.subsonic.url.clone(),
                username: config.subsonic.username.clone(),
                password_configured: !config.subsonic.password.is_empty(),
                timeout_secs: config.subsonic.timeout_secs,
            },
            fetcher: config.fetcher.clone(),
            server: config.server.clone(),
            database: config.database.clone(),
            resolver: config.resolver.clone(),
            scan: config.scan.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[subsonic]
url = "http://localhost:4533"
username = "admin"
password = "secret"

[fetcher]
url = "http://localhost:8686"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.subsonic.url, "http://localhost:4533");
        assert_eq!(config.subsonic.timeout_secs, 30);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.resolver.max_songs, 100);
        assert_eq!(config.resolver.download_delay_secs, 6);
        assert_eq!(config.scan.workers, 8);
        assert!(!config.resolver.dry_run);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[subsonic]
url = "https://music.example.net"
username = "listener"
password = "hunter2"
timeout_secs = 10

[fetcher]
url = "https://fetch.example.net"

[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/cadenza.db"

[resolver]
max_songs = 50
download_delay_secs = 3
dry_run = true

[scan]
album_page_size = 200
workers = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, PathBuf::from("/data/cadenza.db"));
        assert_eq!(config.resolver.max_songs, 50);
        assert!(config.resolver.dry_run);
        assert_eq!(config.scan.album_page_size, 200);
        assert_eq!(config.scan.workers, 4);
        // Unspecified fields keep their defaults
        assert_eq!(config.resolver.post_scan_delay_secs, 2);
        assert_eq!(config.scan.max_albums, 10_000);
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let toml = r#"
[subsonic]
url = "http://localhost:4533"
username = "admin"
password = "secret"

[fetcher]
url = "http://localhost:8686"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("password_configured"));
    }
}
