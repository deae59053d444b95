//! Record-store seam for the image handler.
//!
//! [`ImageRepository`] is the contract the HTTP layer depends on;
//! [`SqliteImageRepository`] implements it on top of the pooled queries.

use sb_core::{Error, Result};

use crate::models::{ImageFields, ImageRecord};
use crate::pool::{get_conn, DbPool};
use crate::queries::images;

/// Message returned whenever an image id does not resolve to a record.
pub const IMAGE_NOT_FOUND: &str = "No such image with this id";

/// Persistent store for image records.
pub trait ImageRepository: Send + Sync {
    /// Insert a record and return it with its assigned id.
    fn create(&self, fields: &ImageFields) -> Result<ImageRecord>;

    /// Look up a record by id.
    fn find(&self, id: i64) -> Result<Option<ImageRecord>>;

    /// Apply `fields` to an existing record.
    fn update(&self, record: &ImageRecord, fields: &ImageFields) -> Result<()>;

    /// Remove a record.
    fn delete(&self, record: &ImageRecord) -> Result<()>;

    /// Every record in the store's natural order.
    fn all(&self) -> Result<Vec<ImageRecord>>;

    /// Number of records other than `excluding_id` that point at `path`.
    fn count_by_path(&self, path: &str, excluding_id: i64) -> Result<u64>;

    /// Reload a record from the store.
    fn refresh(&self, record: &ImageRecord) -> Result<ImageRecord> {
        self.find(record.id)?
            .ok_or_else(|| Error::NotFound(IMAGE_NOT_FOUND.into()))
    }
}

/// SQLite implementation of [`ImageRepository`].
#[derive(Clone)]
pub struct SqliteImageRepository {
    pool: DbPool,
}

impl SqliteImageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ImageRepository for SqliteImageRepository {
    fn create(&self, fields: &ImageFields) -> Result<ImageRecord> {
        let conn = get_conn(&self.pool)?;
        images::create_image(&conn, fields)
    }

    fn find(&self, id: i64) -> Result<Option<ImageRecord>> {
        let conn = get_conn(&self.pool)?;
        images::get_image(&conn, id)
    }

    fn update(&self, record: &ImageRecord, fields: &ImageFields) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if !images::update_image(&conn, record.id, fields)? {
            return Err(Error::NotFound(IMAGE_NOT_FOUND.into()));
        }
        Ok(())
    }

    fn delete(&self, record: &ImageRecord) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if !images::delete_image(&conn, record.id)? {
            tracing::debug!(id = record.id, "Image record already deleted");
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<ImageRecord>> {
        let conn = get_conn(&self.pool)?;
        images::list_images(&conn)
    }

    fn count_by_path(&self, path: &str, excluding_id: i64) -> Result<u64> {
        let conn = get_conn(&self.pool)?;
        images::count_images_by_path(&conn, path, excluding_id)
    }
}
