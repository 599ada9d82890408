mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadenza_core::{
    load_config, validate_config, Catalog, RatingScanner, RatingStore, SqliteRatingStore,
    SubsonicClient, SubsonicFetcher, TrackFetcher,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CADENZA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Catalog server: {}", config.subsonic.url);
    info!("Fetch service: {}", config.fetcher.url);
    info!("Database path: {:?}", config.database.path);
    if config.resolver.dry_run {
        info!("DRY RUN MODE - no fetches or playlist changes will be made");
    }

    // Create catalog client and verify connectivity
    let catalog: Arc<dyn Catalog> = Arc::new(SubsonicClient::new(&config.subsonic));
    match catalog.ping().await {
        Ok(()) => info!("Connected to catalog server"),
        Err(e) => warn!("Catalog server not reachable yet: {}", e),
    }

    // Create rating store
    let rating_store: Arc<dyn RatingStore> = Arc::new(
        SqliteRatingStore::new(&config.database.path).context("Failed to create rating store")?,
    );
    info!("Rating store initialized");

    // Create fetch service client
    let fetcher: Arc<dyn TrackFetcher> =
        Arc::new(SubsonicFetcher::new(&config.fetcher, &config.subsonic));

    // Create rating scanner (daily full-library scan)
    let scanner = Arc::new(RatingScanner::new(
        Arc::clone(&catalog),
        rating_store,
        config.scan.clone(),
    ));

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), catalog, fetcher, scanner));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
