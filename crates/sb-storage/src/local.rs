//! Filesystem blob backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sb_core::{Error, Result};

use crate::{validate_key, BlobStore};

/// Suffix of in-flight writes; such files are never listed.
const TMP_SUFFIX: &str = ".part";

/// Stores blobs as plain files under `{root}/{key}`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new backend rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        validate_key(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.full_path(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| Error::storage(format!("Failed to stat {}: {e}", full.display())))
    }

    async fn store(&self, data: Bytes, path: &str) -> Result<String> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        // Write to a sibling temp file first so readers never see a partial blob.
        let tmp = full.with_file_name(format!(
            "{}.{}{TMP_SUFFIX}",
            full.file_name().and_then(|n| n.to_str()).unwrap_or("blob"),
            uuid::Uuid::new_v4()
        ));
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| Error::storage(format!("Failed to write {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::storage(format!(
                "Failed to move blob into place at {}: {e}",
                full.display()
            )));
        }

        tracing::debug!(path, bytes = data.len(), "Stored blob");
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.full_path(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                tracing::debug!(path, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to delete {}: {e}",
                full.display()
            ))),
        }
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        let full = self.full_path(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!("Failed to read {}: {e}", full.display()))),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || list_files(&root))
            .await
            .map_err(|e| Error::Internal(format!("Blob listing task failed: {e}")))?
    }
}

fn list_files(root: &Path) -> Result<Vec<String>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::storage(format!("Failed to walk storage: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !key.ends_with(TMP_SUFFIX) {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let key = store
            .store(Bytes::from_static(b"pixels"), "images/a.png")
            .await
            .unwrap();
        assert_eq!(key, "images/a.png");
        assert!(dir.path().join("images/a.png").exists());
        assert!(store.exists("images/a.png").await.unwrap());
        assert_eq!(
            store.read("images/a.png").await.unwrap().as_deref(),
            Some(&b"pixels"[..])
        );

        store.delete("images/a.png").await.unwrap();
        assert!(!store.exists("images/a.png").await.unwrap());
        assert!(store.read("images/a.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.delete("images/missing.png").await.unwrap();
        store.delete("images/missing.png").await.unwrap();
    }

    #[tokio::test]
    async fn store_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.store(Bytes::from_static(b"one"), "images/a.png").await.unwrap();
        store.store(Bytes::from_static(b"two"), "images/a.png").await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["images/a.png".to_string()]);
        assert_eq!(
            store.read("images/a.png").await.unwrap().as_deref(),
            Some(&b"two"[..])
        );
    }

    #[tokio::test]
    async fn list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_uses_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.store(Bytes::from_static(b"b"), "images/b.png").await.unwrap();
        store.store(Bytes::from_static(b"a"), "images/a.png").await.unwrap();
        assert_eq!(
            store.list().await.unwrap(),
            vec!["images/a.png".to_string(), "images/b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let err = store
            .store(Bytes::from_static(b"x"), "../outside.png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
