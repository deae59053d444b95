//! Typed database models.

use serde::Serialize;

// ---------------------------------------------------------------------------
// ImageRecord
// ---------------------------------------------------------------------------

/// A persisted image row.
///
/// `name`, `path` and `image` are nullable: a form whose file part was not a
/// valid upload may still be stored without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: i64,
    pub name: Option<String>,
    pub path: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ImageRecord {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            path: row.get(2)?,
            image: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ImageFields
// ---------------------------------------------------------------------------

/// Column values written on create or update.
///
/// On update a `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFields {
    pub name: Option<String>,
    pub path: Option<String>,
    pub image: Option<String>,
}

impl ImageFields {
    /// Fields describing a blob stored under `path` with file name `name`.
    pub fn for_stored_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: Some(name.into()),
            image: Some(path.clone()),
            path: Some(path),
        }
    }
}
