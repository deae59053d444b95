//! sb-server: HTTP API for uploading and managing image records.
//!
//! This crate ties the record store (`sb-db`) and the blob store
//! (`sb-storage`) together behind an Axum router and provides the server
//! entry point with graceful shutdown.

pub mod context;
pub mod error;
pub mod images;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use sb_core::config::{Config, StorageBackend};
use sb_db::repository::SqliteImageRepository;
use sb_storage::{BlobStore, LocalBlobStore, MemoryBlobStore};

use crate::context::AppContext;

/// Start the shutterbox server.
///
/// Initializes the database and blob store, constructs the [`AppContext`],
/// and serves HTTP until a shutdown signal is received.
pub async fn start(config: Config) -> sb_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = sb_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    let blobs = build_blob_store(&config);
    let repo = Arc::new(SqliteImageRepository::new(db));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| sb_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, repo, blobs);
    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| sb_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Construct the configured blob backend.
pub fn build_blob_store(config: &Config) -> Arc<dyn BlobStore> {
    match config.storage.backend {
        StorageBackend::Local => {
            tracing::info!("Storing uploads under {}", config.storage.root.display());
            Arc::new(LocalBlobStore::new(config.storage.root.clone()))
        }
        StorageBackend::Memory => {
            tracing::info!("Storing uploads in memory");
            Arc::new(MemoryBlobStore::new())
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
