use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension,
};

use super::ContractBody;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// POST /api/v1/contracts - Create a listing owned by the caller
///
/// Multipart form: listing fields as text parts, files under `images`,
/// `idProof` and `landProof`.
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ContractBody> {
    let multipart = multipart.map_err(|e| ApiError::upload_error(format!("Upload error: {}", e.body_text())))?;
    let submission = state.uploads.accept(multipart).await?;

    let contract = state.contracts.create(submission.into_patch(), current.user.id).await?;
    Ok(ApiResponse::created(ContractBody { contract }))
}
