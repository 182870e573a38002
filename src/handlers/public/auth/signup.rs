use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::send_token;
use crate::error::ApiError;
use crate::services::SignupRequest;
use crate::state::AppState;

/// POST /api/v1/auth/signup - Create an account and sign in
///
/// Body: `{ "name", "email", "password", "role"? }`. Any role other than
/// `farmer` creates a buyer.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = state.accounts.signup(request).await?;
    send_token(&state, jar, user, StatusCode::CREATED)
}
