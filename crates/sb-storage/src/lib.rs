//! sb-storage: blob storage backends for uploaded files.
//!
//! Blobs are addressed by a relative, `/`-separated key such as
//! `images/<name>`. [`BlobStore`] abstracts over the backend so the HTTP
//! layer never touches the filesystem directly.

mod local;
mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use sb_core::{Error, Result};

/// Storage backend for file blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check if a blob exists under `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Write `data` under `path`, replacing any existing blob, and return the key.
    async fn store(&self, data: Bytes, path: &str) -> Result<String>;

    /// Delete the blob under `path`. Deleting a missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Read the blob under `path`, or `None` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<Bytes>>;

    /// Every stored key, sorted.
    async fn list(&self) -> Result<Vec<String>>;
}

/// Reject keys that could escape the storage root.
pub fn validate_key(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if invalid {
        return Err(Error::Validation(format!("Invalid storage path: {path}")));
    }
    Ok(())
}
