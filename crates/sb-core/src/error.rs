//! Unified error type for shutterbox.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

/// Unified error type covering all failure modes in shutterbox.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No record exists for the requested identifier.
    ///
    /// Existing clients expect a 400 here, so this does not map to 404.
    #[error("{0}")]
    NotFound(String),

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// The request body exceeded the configured upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A blob requested through the public storage route does not exist.
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The blob storage backend failed.
    #[error("Storage error: {source}")]
    Storage {
        /// The underlying backend error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound(_) => 400,
            Error::Validation(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            Error::BlobNotFound(_) => 404,
            Error::Database { .. } => 500,
            Error::Storage { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge(_) => "payload_too_large",
            Error::BlobNotFound(_) => "blob_not_found",
            Error::Database { .. } => "database_error",
            Error::Storage { .. } => "storage_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Storage {
            source: source.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
