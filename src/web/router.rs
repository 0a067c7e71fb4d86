//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    EntryResponse, MessageResponse, MkdirRequest, RenameRequest, StorageResponse, UploadResponse,
    UploadedFile,
};
use super::handlers::{self, AppState};
use super::middleware::create_cors_layer;
use crate::config::Config;

/// Multipart framing on top of the file payloads.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(title = "homedrive", description = "Personal cloud drive API"),
    paths(
        handlers::file::list_entries,
        handlers::file::upload_files,
        handlers::file::download,
        handlers::file::delete_file,
        handlers::file::make_directory,
        handlers::file::rename_entry,
        handlers::storage::get_storage,
    ),
    components(schemas(
        EntryResponse,
        MessageResponse,
        MkdirRequest,
        RenameRequest,
        StorageResponse,
        UploadResponse,
        UploadedFile,
    )),
    tags(
        (name = "files", description = "Browse and modify the drive"),
        (name = "storage", description = "Usage and quota"),
    )
)]
struct ApiDoc;

/// Request body limit for an upload carrying `max_files` files of up to `max_file_size` bytes.
fn upload_body_limit(max_file_size: u64, max_files: usize) -> usize {
    let total = max_file_size
        .saturating_mul(max_files as u64)
        .saturating_add(MULTIPART_OVERHEAD);
    usize::try_from(total).unwrap_or(usize::MAX)
}

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, config: &Config) -> Router {
    let body_limit = upload_body_limit(app_state.max_upload_size, app_state.max_files_per_upload);

    let api_routes = Router::new()
        .route("/list", get(handlers::list_entries))
        .route(
            "/upload",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/download/:filename", get(handlers::download))
        .route("/delete/:filename", delete(handlers::delete_file))
        .route("/mkdir", post(handlers::make_directory))
        .route("/rename", post(handlers::rename_entry))
        .route("/storage", get(handlers::get_storage));

    let mut router = Router::new().nest("/api", api_routes);
    if config.server.serve_root {
        router = router.route("/raw/*path", get(handlers::raw_file));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.server.cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the OpenAPI document and Swagger UI router.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Create a router serving the built frontend.
///
/// Unknown paths fall back to `index.html` so client-side routes resolve.
/// Returns `None` when `path` does not exist.
pub fn create_static_router(path: &str) -> Option<Router> {
    let dir = Path::new(path);
    if !dir.is_dir() {
        tracing::warn!("Static path {} not found, frontend disabled", path);
        return None;
    }

    let index = dir.join("index.html");
    let serve_dir = ServeDir::new(dir).fallback(ServeFile::new(index));
    Some(Router::new().fallback_service(serve_dir))
}
