use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::filter::ContractFilter;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::Contract;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContractList {
    results: usize,
    contracts: Vec<Contract>,
}

/// GET /api/v1/contracts - Listings matching the query, newest first
///
/// Exact-match parameters: cropName, cropCategory, cropVariety, state,
/// district, village, pinCode, status, paymentMode, preferredBuyerType,
/// createdBy. Also `search`, `minPrice`, `maxPrice` and `mine=true`.
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<ContractList> {
    let Query(pairs) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let filter = ContractFilter::from_pairs(&pairs, current.user.id)?;

    let contracts = state.contracts.list(&filter).await?;
    Ok(ApiResponse::success(ContractList {
        results: contracts.len(),
        contracts,
    }))
}
