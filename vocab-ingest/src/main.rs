//! vocab-ingest - Bulk vocabulary ingestion service
//!
//! Accepts word lists, deduplicates them against stored cards, translates
//! them, generates illustrations and stores the resulting cards. Also runs
//! image backfills over existing cards. Progress is streamed over SSE.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_common::config::{resolve_config, RootFolderInitializer, RootFolderResolver};
use vocab_common::events::EventBus;

use vocab_ingest::db::{self, SqliteStore};
use vocab_ingest::pipeline::Collaborators;
use vocab_ingest::services::{CachedTranslator, HttpImageGenerator, HttpTranslator, TranslationCache};
use vocab_ingest::utils::RetryPolicy;
use vocab_ingest::AppState;

/// Command-line arguments for vocab-ingest
#[derive(Parser, Debug)]
#[command(name = "vocab-ingest")]
#[command(about = "Bulk vocabulary ingestion service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "VOCAB_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding the database and translation cache
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Listen address, overrides [server] bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing (RUST_LOG wins over the config file level)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vocab_ingest={0},vocab_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting vocab-ingest");
    info!("Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    // Resolve and create the root folder
    let root_folder = RootFolderResolver::new(args.root_folder, &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    // Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = db::init_database_pool(&db_path).await?;
    let store = Arc::new(SqliteStore::new(pool));

    // Remote clients
    let cache = Arc::new(TranslationCache::new(initializer.translation_cache_path()));
    info!("Translation cache entries: {}", cache.load());

    let http_translator =
        HttpTranslator::new(&config.translation).context("Failed to create translation client")?;
    let translator = Arc::new(CachedTranslator::new(Arc::new(http_translator), cache));
    let images =
        Arc::new(HttpImageGenerator::new(&config.images).context("Failed to create image client")?);

    let collaborators = Collaborators {
        cards: store.clone(),
        tags: store,
        translator,
        images,
    };

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(256);

    let state = AppState::new(
        collaborators,
        &config.pipeline,
        RetryPolicy::from_config(&config.retry),
        event_bus,
    );
    let app = vocab_ingest::build_router(state);

    let bind_address = args.bind.unwrap_or(config.server.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
