//! Image resource handling: record and blob lifecycle.
//!
//! [`ImageService`] is the only place that decides file names, clears stale
//! blobs on replace/delete, and orders validation. Route handlers parse the
//! request into an [`ImageForm`] and hand it over.

use std::sync::Arc;

use bytes::Bytes;
use sb_core::{Error, Result};
use sb_db::models::{ImageFields, ImageRecord};
use sb_db::repository::{ImageRepository, IMAGE_NOT_FOUND};
use sb_storage::BlobStore;
use sha2::{Digest, Sha256};

/// Directory prefix under which every uploaded file is stored.
pub const IMAGE_DIR: &str = "images";

pub const EMPTY_BODY: &str = "Your request have a empty body";
pub const INVALID_UPLOAD: &str = "The uploaded image is not valid";
/// `destroy` historically answers with a capitalised "ID".
pub const DESTROY_NOT_FOUND: &str = "No such image with this ID";
pub const DELETED: &str = "Image successful deleted";

/// Hex characters of the SHA-256 digest kept in generated file names.
const HASH_LEN: usize = 40;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A file part received in an upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name supplied by the client, if any.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    /// An upload is usable when the part was sent as a named file with content.
    pub fn is_valid(&self) -> bool {
        self.file_name.as_deref().is_some_and(|n| !n.trim().is_empty()) && !self.data.is_empty()
    }
}

/// Parsed upload request: raw scalar fields plus the optional file part.
#[derive(Debug, Clone, Default)]
pub struct ImageForm {
    pub name: Option<String>,
    pub path: Option<String>,
    pub image: Option<UploadedFile>,
}

impl ImageForm {
    /// The scalar fields exactly as the client sent them.
    fn raw_fields(&self) -> ImageFields {
        ImageFields {
            name: self.name.clone(),
            path: self.path.clone(),
            image: None,
        }
    }
}

/// What to do with a file part that is present but not a usable upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadPolicy {
    /// Fail the request instead of persisting the raw fields without a file.
    pub reject_invalid: bool,
}

// ---------------------------------------------------------------------------
// ImageService
// ---------------------------------------------------------------------------

/// Coordinates the record store and the blob store for image resources.
pub struct ImageService {
    repo: Arc<dyn ImageRepository>,
    blobs: Arc<dyn BlobStore>,
    policy: UploadPolicy,
}

impl ImageService {
    pub fn new(
        repo: Arc<dyn ImageRepository>,
        blobs: Arc<dyn BlobStore>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            repo,
            blobs,
            policy,
        }
    }

    /// All image records.
    pub async fn list(&self) -> Result<Vec<ImageRecord>> {
        self.repo.all()
    }

    /// Create a record from an upload.
    ///
    /// A valid file is stored under its content-hash name and the record's
    /// `name`, `path` and `image` are taken from it, ignoring any client
    /// values for those fields.
    pub async fn create(&self, form: ImageForm) -> Result<ImageRecord> {
        let Some(file) = form.image.as_ref() else {
            return Err(Error::Validation(EMPTY_BODY.into()));
        };

        let fields = if file.is_valid() {
            self.finalize(file).await?
        } else {
            self.invalid_upload(&form)?
        };

        let record = self.repo.create(&fields)?;
        tracing::info!(id = record.id, path = ?record.path, "Image created");
        Ok(record)
    }

    /// Fetch one record.
    pub async fn show(&self, id: i64) -> Result<ImageRecord> {
        self.repo
            .find(id)?
            .ok_or_else(|| Error::NotFound(IMAGE_NOT_FOUND.into()))
    }

    /// Replace the file behind a record.
    ///
    /// Existence is checked before the body. The old blob is removed before
    /// the new one is written, and the returned record is reloaded from the
    /// store.
    pub async fn update(&self, id: i64, form: ImageForm) -> Result<ImageRecord> {
        let record = self
            .repo
            .find(id)?
            .ok_or_else(|| Error::NotFound(IMAGE_NOT_FOUND.into()))?;

        let Some(file) = form.image.as_ref() else {
            return Err(Error::Validation(EMPTY_BODY.into()));
        };

        let fields = if file.is_valid() {
            self.remove_blob(&record).await?;
            self.finalize(file).await?
        } else {
            self.invalid_upload(&form)?
        };

        self.repo.update(&record, &fields)?;
        let updated = self.repo.refresh(&record)?;
        tracing::info!(
            id = updated.id,
            old_path = ?record.path,
            new_path = ?updated.path,
            "Image updated"
        );
        Ok(updated)
    }

    /// Delete a record together with its blob.
    pub async fn destroy(&self, id: i64) -> Result<()> {
        let record = self
            .repo
            .find(id)?
            .ok_or_else(|| Error::NotFound(DESTROY_NOT_FOUND.into()))?;

        self.remove_blob(&record).await?;
        self.repo.delete(&record)?;
        tracing::info!(id = record.id, path = ?record.path, "Image deleted");
        Ok(())
    }

    /// Store an uploaded file under its canonical name.
    ///
    /// This is the only path through which a file enters storage.
    async fn finalize(&self, file: &UploadedFile) -> Result<ImageFields> {
        let name = hashed_name(file);
        let path = self
            .blobs
            .store(file.data.clone(), &format!("{IMAGE_DIR}/{name}"))
            .await?;
        Ok(ImageFields::for_stored_file(name, path))
    }

    /// Delete the blob behind `record`, unless another record still points at it.
    async fn remove_blob(&self, record: &ImageRecord) -> Result<()> {
        let Some(path) = record.path.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        if sb_storage::validate_key(path).is_err() {
            tracing::warn!(path, "Skipping removal of blob with unusable path");
            return Ok(());
        }
        let others = self.repo.count_by_path(path, record.id)?;
        if others > 0 {
            tracing::debug!(path, others, "Blob still referenced; keeping it");
            return Ok(());
        }
        if self.blobs.exists(path).await? {
            self.blobs.delete(path).await?;
            tracing::debug!(path, "Removed stale blob");
        }
        Ok(())
    }

    fn invalid_upload(&self, form: &ImageForm) -> Result<ImageFields> {
        if self.policy.reject_invalid {
            return Err(Error::Validation(INVALID_UPLOAD.into()));
        }
        tracing::warn!("Upload is not a valid file; persisting form fields without a file");
        Ok(form.raw_fields())
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Canonical file name for an upload: a content hash plus an extension.
///
/// The hash ignores the client's file name, so identical content always maps
/// to the same name.
pub fn hashed_name(file: &UploadedFile) -> String {
    let digest = Sha256::digest(&file.data);
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    format!("{hash}.{}", extension_for(file))
}

/// Extension from the sniffed image format, else the client file name, else the
/// declared content type, else `bin`.
fn extension_for(file: &UploadedFile) -> String {
    if let Some(ext) = image::guess_format(&file.data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
    {
        return ext.to_string();
    }

    file.file_name
        .as_deref()
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .or_else(|| {
            file.content_type
                .as_deref()
                .and_then(image::ImageFormat::from_mime_type)
                .and_then(|format| format.extensions_str().first().copied())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "bin".to_string())
}
