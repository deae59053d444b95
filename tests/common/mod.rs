//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, an in-memory blob
//! store, and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use sb_core::config::Config;
use sb_db::models::{ImageFields, ImageRecord};
use sb_db::pool::{init_memory_pool, DbPool};
use sb_db::repository::SqliteImageRepository;
use sb_server::context::AppContext;
use sb_server::router::build_router;
use sb_storage::MemoryBlobStore;

/// Bytes that sniff as a PNG, so uploads get a `.png` name.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR fake png payload";

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and blob store.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let blobs = Arc::new(MemoryBlobStore::new());
        let repo = Arc::new(SqliteImageRepository::new(db.clone()));
        let ctx = AppContext::new(config, repo, blobs.clone());
        Self { ctx, db, blobs }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Insert `n` records directly, without blobs.
    pub fn create_images(&self, n: usize) -> Vec<ImageRecord> {
        let conn = sb_db::pool::get_conn(&self.db).expect("failed to get db connection");
        (0..n)
            .map(|i| {
                let name = format!("seed{i}.png");
                let fields = ImageFields::for_stored_file(name.clone(), format!("images/{name}"));
                sb_db::queries::images::create_image(&conn, &fields).expect("failed to seed image")
            })
            .collect()
    }
}

/// Multipart form with a single `image` file part.
pub fn image_form(file_name: &str, data: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("valid mime");
    reqwest::multipart::Form::new().part("image", part)
}
