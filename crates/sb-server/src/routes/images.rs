//! Image upload CRUD route handlers.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::images::{ImageForm, UploadedFile, DELETED};
use crate::middleware::request_id::RequestId;

/// Image record as returned by the API.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    pub id: i64,
    pub name: Option<String>,
    pub path: Option<String>,
    pub image: Option<String>,
    /// Public URL of the stored file.
    pub link: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ImageResponse {
    pub fn from_model(img: &sb_db::models::ImageRecord) -> Self {
        Self {
            id: img.id,
            name: img.name.clone(),
            path: img.path.clone(),
            image: img.image.clone(),
            link: img.path.as_ref().map(|p| format!("/storage/{p}")),
            created_at: img.created_at.clone(),
            updated_at: img.updated_at.clone(),
        }
    }
}

/// Multipart body accepted by create and update. Documentation only.
#[derive(utoipa::ToSchema)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    pub name: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/upload
#[utoipa::path(
    get,
    path = "/api/upload",
    responses(
        (status = 200, description = "List all images", body = Vec<ImageResponse>)
    )
)]
pub async fn list_images(
    State(ctx): State<AppContext>,
    Extension(rid): Extension<RequestId>,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let images = ctx.images.list().await.map_err(|e| rid.error(e))?;
    Ok(Json(images.iter().map(ImageResponse::from_model).collect()))
}

/// POST /api/upload
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image created", body = ImageResponse),
        (status = 400, description = "No image in the request", body = MessageResponse)
    )
)]
pub async fn create_image(
    State(ctx): State<AppContext>,
    Extension(rid): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart).await.map_err(|e| rid.error(e))?;
    let image = ctx.images.create(form).await.map_err(|e| rid.error(e))?;
    Ok((StatusCode::CREATED, Json(ImageResponse::from_model(&image))))
}

/// GET /api/upload/:id
#[utoipa::path(
    get,
    path = "/api/upload/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image details", body = ImageResponse),
        (status = 400, description = "No such image", body = MessageResponse)
    )
)]
pub async fn get_image(
    State(ctx): State<AppContext>,
    Extension(rid): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = ctx.images.show(id).await.map_err(|e| rid.error(e))?;
    Ok(Json(ImageResponse::from_model(&image)))
}

/// PUT/PATCH /api/upload/:id
#[utoipa::path(
    put,
    path = "/api/upload/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image replaced", body = ImageResponse),
        (status = 400, description = "No such image, or no image in the request", body = MessageResponse)
    )
)]
pub async fn update_image(
    State(ctx): State<AppContext>,
    Extension(rid): Extension<RequestId>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let form = read_form(multipart).await.map_err(|e| rid.error(e))?;
    let image = ctx.images.update(id, form).await.map_err(|e| rid.error(e))?;
    Ok(Json(ImageResponse::from_model(&image)))
}

/// DELETE /api/upload/:id
#[utoipa::path(
    delete,
    path = "/api/upload/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 400, description = "No such image", body = MessageResponse)
    )
)]
pub async fn delete_image(
    State(ctx): State<AppContext>,
    Extension(rid): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.images.destroy(id).await.map_err(|e| rid.error(e))?;
    Ok(Json(MessageResponse {
        message: DELETED.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Multipart parsing
// ---------------------------------------------------------------------------

/// Collect the recognised parts of an upload body.
///
/// A body that is not multipart at all (JSON, or nothing) reads as an empty
/// form so the service can report the missing image itself.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> sb_core::Result<ImageForm> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::debug!("Body is not multipart ({rejection}); reading as empty form");
            return Ok(ImageForm::default());
        }
    };

    let mut form = ImageForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("image") => {
                if form.image.is_some() {
                    return Err(sb_core::Error::Validation(
                        "Only one image may be uploaded per request".into(),
                    ));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                form.image = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("name") => form.name = Some(field.text().await.map_err(multipart_error)?),
            Some("path") => form.path = Some(field.text().await.map_err(multipart_error)?),
            other => tracing::trace!(field = ?other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> sb_core::Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        sb_core::Error::PayloadTooLarge(e.body_text())
    } else {
        sb_core::Error::Validation(format!("Malformed multipart body: {}", e.body_text()))
    }
}
