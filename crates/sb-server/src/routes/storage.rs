//! Public serving of stored blobs.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /storage/*path
pub async fn serve_blob(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if sb_storage::validate_key(&path).is_err() {
        return Err(sb_core::Error::BlobNotFound(path).into());
    }

    let data = ctx
        .blobs
        .read(&path)
        .await?
        .ok_or_else(|| sb_core::Error::BlobNotFound(path.clone()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            // Names are content hashes, so a key never changes meaning.
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
