//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use sb_core::config::Config;
use sb_db::repository::ImageRepository;
use sb_storage::BlobStore;

use crate::images::{ImageService, UploadPolicy};

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Image record and file lifecycle.
    pub images: Arc<ImageService>,
    /// Blob backend, also read directly by the public storage route.
    pub blobs: Arc<dyn BlobStore>,
}

impl AppContext {
    /// Wire the image service from its two stores.
    pub fn new(
        config: Config,
        repo: Arc<dyn ImageRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let policy = UploadPolicy {
            reject_invalid: config.uploads.reject_invalid,
        };
        Self {
            images: Arc::new(ImageService::new(repo, blobs.clone(), policy)),
            config: Arc::new(config),
            blobs,
        }
    }
}
