use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension,
};

use super::ContractBody;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/v1/contracts/:id - Get a single listing
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ContractBody> {
    let contract = state.contracts.get_by_id(&id).await?;
    Ok(ApiResponse::success(ContractBody { contract }))
}

/// PUT /api/v1/contracts/:id - Merge form fields and new files into a listing
///
/// Only the owner may update. Ownership is checked before any upload is
/// stored.
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ContractBody> {
    let caller = current.user.id;
    state.contracts.get_owned(&id, caller).await?;

    let multipart = multipart.map_err(|e| ApiError::upload_error(format!("Upload error: {}", e.body_text())))?;
    let submission = state.uploads.accept(multipart).await?;

    let contract = state.contracts.update_by_id(&id, submission.into_patch(), caller).await?;
    Ok(ApiResponse::success(ContractBody { contract }))
}

/// DELETE /api/v1/contracts/:id - Remove a listing (owner only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.contracts.delete_by_id(&id, current.user.id).await?;
    Ok(ApiResponse::no_content())
}
