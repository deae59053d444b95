//! In-memory blob backend, used by tests and the `memory` storage setting.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use sb_core::Result;

use crate::{validate_key, BlobStore};

/// Keeps blobs in a sorted map guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Snapshot of every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.blobs.read().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        validate_key(path)?;
        Ok(self.blobs.read().contains_key(path))
    }

    async fn store(&self, data: Bytes, path: &str) -> Result<String> {
        validate_key(path)?;
        self.blobs.write().insert(path.to_string(), data);
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        validate_key(path)?;
        self.blobs.write().remove(path);
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        validate_key(path)?;
        Ok(self.blobs.read().get(path).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.keys())
    }
}
