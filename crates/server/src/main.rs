use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drillbook_core::{
    config_path, load_config, validate_config, CatalogSource, CatalogStore, CatalogSyncer, LeetCodeClient,
    SolvedStore, SqliteCatalogStore, SqliteSolvedStore,
};
use drillbook_server::api::create_router;
use drillbook_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
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

    let path = config_path();
    info!(version = VERSION, config = %path.display(), "drillbook starting");
    let config =
        load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;

    // Both stores share one SQLite file
    info!(path = %config.database.path.display(), "Opening database");
    let catalog: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalogStore::new(&config.database.path)
            .context("Failed to create catalog store")?,
    );

    let solved: Arc<dyn SolvedStore> = Arc::new(
        SqliteSolvedStore::new(&config.database.path).context("Failed to create solved store")?,
    );

    let source: Arc<dyn CatalogSource> = Arc::new(
        LeetCodeClient::new(config.catalog_source.clone())
            .context("Failed to create catalog source")?,
    );

    let syncer = CatalogSyncer::new(source, Arc::clone(&catalog), config.sync.clone());
    info!(
        endpoint = %config.catalog_source.endpoint,
        page_size = config.sync.page_size,
        page_delay_ms = config.sync.page_delay_ms,
        max_offset = config.sync.max_offset,
        "Catalog sync configured"
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let app = create_router(Arc::new(AppState::new(config, catalog, solved, syncer)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
