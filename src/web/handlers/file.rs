//! File and folder handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, Query, Request, State},
    http::{header, HeaderValue, Method},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{run_blocking, AppState};
use crate::store::{archive, format_bytes, DownloadTarget, RelPath};
use crate::web::dto::{
    ApiResponse, EntryResponse, MessageResponse, MkdirRequest, PathQuery, RenameRequest,
    UploadResponse, UploadedFile, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::DriveError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped, quotes and backslashes are replaced in
/// the ASCII fallback, and non-ASCII names get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

fn disposition_value(filename: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&content_disposition_header(filename)).map_err(|e| {
        tracing::error!("Invalid Content-Disposition for {:?}: {}", filename, e);
        ApiError::internal("Failed to build response")
    })
}

/// Browsers on some platforms send the full client path; keep the last segment.
fn client_file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Stream one multipart file field into `file`, returning the bytes written.
///
/// Fails with 413 as soon as the field grows past `max_size`.
async fn write_field(
    field: &mut Field<'_>,
    file: std::fs::File,
    max_size: u64,
    original_name: &str,
) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::from_std(file);
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        tracing::error!("Failed to read file content: {}", e);
        ApiError::bad_request("Failed to read file")
    })? {
        written += chunk.len() as u64;
        if written > max_size {
            return Err(ApiError::payload_too_large(format!(
                "{} is too large (max {})",
                original_name,
                format_bytes(max_size)
            )));
        }
        file.write_all(&chunk).await.map_err(DriveError::from)?;
    }

    file.flush().await.map_err(DriveError::from)?;
    Ok(written)
}

/// Remove a file left behind by a failed upload.
async fn discard_partial(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e);
    }
}

/// GET /api/list - List the entries of a directory.
#[utoipa::path(
    get,
    path = "/api/list",
    tag = "files",
    params(PathQuery),
    responses(
        (status = 200, description = "Directory entries", body = Vec<EntryResponse>),
        (status = 400, description = "Invalid path"),
        (status = 404, description = "Directory not found")
    )
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<Vec<EntryResponse>>>, ApiError> {
    let rel = RelPath::parse(&query.path)?;

    let store = state.store.clone();
    let entries = run_blocking(move || store.list(&rel)).await?;

    Ok(Json(ApiResponse::new(
        entries.into_iter().map(EntryResponse::from).collect(),
    )))
}

/// POST /api/upload - Upload one or more files.
///
/// Request body: multipart/form-data with any number of `files` fields and an
/// optional `path` text field. A `path` field applies to the files after it;
/// the `path` query parameter sets the initial target directory.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    params(PathQuery),
    responses(
        (status = 200, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Invalid path or multipart data"),
        (status = 404, description = "Target directory not found"),
        (status = 413, description = "File too large"),
        (status = 507, description = "Quota exceeded")
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut rel = RelPath::parse(&query.path)?;
    let mut uploaded: Vec<UploadedFile> = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "path" => {
                let raw = field.text().await.map_err(|e| {
                    tracing::error!("Failed to read path field: {}", e);
                    ApiError::bad_request("Invalid path field")
                })?;
                rel = RelPath::parse(&raw)?;
            }
            "files" | "file" => {
                if uploaded.len() >= state.max_files_per_upload {
                    return Err(ApiError::bad_request(format!(
                        "Too many files (max {})",
                        state.max_files_per_upload
                    )));
                }

                let original_name = field
                    .file_name()
                    .map(|s| client_file_name(s).to_string())
                    .ok_or_else(|| ApiError::bad_request("File field without a filename"))?;

                let store = state.store.clone();
                let (target, file_name) = (rel.clone(), original_name.clone());
                let claimed = run_blocking(move || store.create_unique(&target, &file_name)).await?;
                let (path, stored_name) = (claimed.path, claimed.name);

                let size = match write_field(
                    &mut field,
                    claimed.file,
                    state.max_upload_size,
                    &original_name,
                )
                .await
                {
                    Ok(size) => size,
                    Err(e) => {
                        discard_partial(&path).await;
                        return Err(e);
                    }
                };

                let store = state.store.clone();
                if let Err(e) = run_blocking(move || store.ensure_within_quota(size)).await {
                    discard_partial(&path).await;
                    return Err(e);
                }

                tracing::info!(
                    path = %rel,
                    original = %original_name,
                    stored = %stored_name,
                    size,
                    "Stored upload"
                );

                uploaded.push(UploadedFile {
                    original_name,
                    stored_name,
                    size,
                });
            }
            _ => {}
        }
    }

    if uploaded.is_empty() {
        return Err(ApiError::bad_request("No files provided"));
    }

    Ok(Json(ApiResponse::new(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        files: uploaded,
    })))
}

/// GET /api/download/:filename - Download a file, or a directory as zip.
///
/// Files honour `Range` and report `Content-Length`; directories stream a zip
/// archive named `<filename>.zip` as it is built.
#[utoipa::path(
    get,
    path = "/api/download/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Entry name inside `path`"),
        PathQuery
    ),
    responses(
        (status = 200, description = "File content or zip archive"),
        (status = 206, description = "Partial file content"),
        (status = 400, description = "Invalid path"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(query): Query<PathQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let rel = RelPath::parse(&query.path)?;

    let store = state.store.clone();
    let (dir, name) = (rel.clone(), filename.clone());
    let target = run_blocking(move || store.download_target(&dir, &name)).await?;

    match target {
        DownloadTarget::File(path) => {
            let response = match ServeFile::new(path).oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };

            let mut response = response.map(Body::new);
            if response.status().is_success() {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, disposition_value(&filename)?);
            }
            Ok(response)
        }
        DownloadTarget::Directory(_) => {
            let archive_name = format!("{filename}.zip");
            let body = if request.method() == Method::HEAD {
                Body::empty()
            } else {
                tracing::info!(path = %rel, name = %filename, "Streaming directory archive");
                Body::from_stream(archive::zip_stream(state.store.clone(), rel.join(&filename)?))
            };

            Response::builder()
                .header(header::CONTENT_TYPE, "application/zip")
                .header(header::CONTENT_DISPOSITION, disposition_value(&archive_name)?)
                .body(body)
                .map_err(|e| {
                    tracing::error!("Failed to build response: {}", e);
                    ApiError::internal("Failed to build response")
                })
        }
    }
}

/// GET /raw/*path - Serve a file from the storage root as-is.
///
/// Resolution goes through the store, so links leading outside the root are
/// refused like everywhere else.
pub async fn raw_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let rel = RelPath::parse(&path)?;

    let store = state.store.clone();
    let file = run_blocking(move || store.file_path(&rel)).await?;

    match ServeFile::new(file).oneshot(request).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(never) => match never {},
    }
}

/// DELETE /api/delete/:filename - Delete a single file.
#[utoipa::path(
    delete,
    path = "/api/delete/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "File name inside `path`"),
        PathQuery
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 400, description = "Invalid filename"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Failed to delete file")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rel = RelPath::parse(&query.path)?;

    let store = state.store.clone();
    let (dir, name) = (rel.clone(), filename.clone());
    run_blocking(move || store.delete(&dir, &name)).await?;

    tracing::info!(path = %rel, name = %filename, "Deleted file");

    Ok(Json(ApiResponse::new(MessageResponse::new(
        "File deleted successfully",
    ))))
}

/// POST /api/mkdir - Create a directory.
#[utoipa::path(
    post,
    path = "/api/mkdir",
    tag = "files",
    request_body = MkdirRequest,
    responses(
        (status = 200, description = "Folder created", body = MessageResponse),
        (status = 400, description = "Invalid folder name or path"),
        (status = 404, description = "Parent directory not found"),
        (status = 409, description = "Folder already exists"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn make_directory(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<MkdirRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rel = RelPath::parse(&req.path)?;

    let store = state.store.clone();
    let (dir, name) = (rel.clone(), req.name.clone());
    run_blocking(move || store.make_directory(&dir, &name)).await?;

    tracing::info!(path = %rel, name = %req.name, "Created folder");

    Ok(Json(ApiResponse::new(MessageResponse::new("Folder created"))))
}

/// POST /api/rename - Rename a file or directory.
#[utoipa::path(
    post,
    path = "/api/rename",
    tag = "files",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Entry renamed", body = MessageResponse),
        (status = 400, description = "Invalid name or path"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Target name already exists"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn rename_entry(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let rel = RelPath::parse(&req.path)?;

    let store = state.store.clone();
    let (dir, old_name, new_name) = (rel.clone(), req.old_name.clone(), req.new_name.clone());
    run_blocking(move || store.rename(&dir, &old_name, &new_name)).await?;

    tracing::info!(path = %rel, from = %req.old_name, to = %req.new_name, "Renamed entry");

    Ok(Json(ApiResponse::new(MessageResponse::new("Renamed"))))
}
