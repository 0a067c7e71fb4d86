//! Storage status handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::{run_blocking, AppState};
use crate::web::dto::{ApiResponse, StorageResponse};
use crate::web::error::ApiError;

/// GET /api/storage - Used space against the quota.
///
/// Usage is recomputed from disk on every call.
#[utoipa::path(
    get,
    path = "/api/storage",
    tag = "storage",
    responses(
        (status = 200, description = "Storage usage", body = StorageResponse),
        (status = 500, description = "Failed to calculate storage")
    )
)]
pub async fn get_storage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StorageResponse>>, ApiError> {
    let store = state.store.clone();
    let usage = run_blocking(move || store.usage()).await?;

    Ok(Json(ApiResponse::new(usage.into())))
}
