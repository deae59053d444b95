//! Axum router construction.
//!
//! Builds the full application router with the image routes, public blob
//! serving, middleware layers, and the OpenAPI document.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::images::list_images,
        routes::images::create_image,
        routes::images::get_image,
        routes::images::update_image,
        routes::images::delete_image,
    ),
    components(schemas(
        routes::images::ImageResponse,
        routes::images::ImageUploadForm,
        routes::images::MessageResponse,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/upload",
            get(routes::images::list_images).post(routes::images::create_image),
        )
        .route(
            "/upload/{id}",
            get(routes::images::get_image)
                .put(routes::images::update_image)
                .patch(routes::images::update_image)
                .delete(routes::images::delete_image),
        )
        .layer(DefaultBodyLimit::max(ctx.config.uploads.max_bytes));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .route("/storage/{*path}", get(routes::storage::serve_blob))
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use sb_core::config::Config;
    use sb_db::pool::init_memory_pool;
    use sb_db::repository::SqliteImageRepository;
    use sb_storage::MemoryBlobStore;
    use tower::ServiceExt;

    fn app() -> Router {
        let repo = Arc::new(SqliteImageRepository::new(init_memory_pool().unwrap()));
        let ctx = AppContext::new(Config::default(), repo, Arc::new(MemoryBlobStore::new()));
        build_router(ctx)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let (status, json) = send(app(), Request::get("/api/upload").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn json_body_on_create_reads_as_empty() {
        let request = Request::post("/api/upload")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Your request have a empty body");
        assert!(json["request_id"].is_string());
    }

    #[tokio::test]
    async fn missing_blob_is_404() {
        let (status, json) = send(
            app(),
            Request::get("/storage/images/none.png").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "blob_not_found");
    }

    #[tokio::test]
    async fn openapi_lists_upload_paths() {
        let (status, json) = send(
            app(),
            Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["paths"]["/api/upload"].is_object());
        assert!(json["paths"]["/api/upload/{id}"].is_object());
    }
}
