//! API integration tests.
//!
//! These spawn the real `cadenza` binary against an unreachable catalog and
//! exercise the HTTP surface: health degradation, config redaction, stats
//! and metrics endpoints.

use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config pointing at servers that refuse connections instantly.
fn test_config(port: u16, db_path: &str) -> String {
    format!(
        r#"
[subsonic]
url = "http://127.0.0.1:1"
username = "admin"
password = "super-secret-password"
timeout_secs = 1

[fetcher]
url = "http://127.0.0.1:1"
timeout_secs = 1

[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_cadenza"))
        .env("CADENZA_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(client: &Client, port: u16, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_http_surface() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cadenza.db");

    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        "{}",
        test_config(port, &db_path.display().to_string())
    )
    .unwrap();

    let _server = spawn_server(config_file.path());
    let client = Client::new();
    assert!(
        wait_for_server(&client, port, 100).await,
        "server did not come up"
    );

    let base = format!("http://127.0.0.1:{}", port);

    // Health: up, but degraded because the catalog refuses connections
    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "degraded");
    assert!(health["uptime_secs"].as_i64().is_some());

    // Config: secrets must be redacted
    let config_response = client
        .get(format!("{base}/api/v1/config"))
        .send()
        .await
        .unwrap();
    assert!(config_response.status().is_success());
    let config_text = config_response.text().await.unwrap();
    assert!(!config_text.contains("super-secret-password"));
    assert!(config_text.contains("password_configured"));

    // Stats: all counters start at zero
    let stats: Value = client
        .get(format!("{base}/api/v1/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["songs_found"], 0);
    assert_eq!(stats["songs_failed"], 0);
    assert_eq!(stats["playlists_created"], 0);

    // Metrics: Prometheus text format
    let metrics_text = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics_text.contains("cadenza_"));

    // Resolve request validation: empty candidate list is a 400
    let bad = client
        .post(format!("{base}/api/v1/playlists/resolve"))
        .json(&serde_json::json!({
            "playlist": "Discovery",
            "candidates": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_config_exits_nonzero() {
    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_cadenza"))
        .env("CADENZA_CONFIG", "/nonexistent/cadenza.toml")
        .env("RUST_LOG", "error")
        .status()
        .await
        .unwrap();
    assert!(!status.success());
}
