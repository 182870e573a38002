use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::send_token;
use crate::error::ApiError;
use crate::services::LoginRequest;
use crate::state::AppState;

/// POST /api/v1/auth/login - Exchange email and password for a credential
///
/// Unknown email is 404 and a wrong password is 401; neither sets a cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = state.accounts.login(request).await?;
    tracing::info!("user {} logged in", user.id);
    send_token(&state, jar, user, StatusCode::OK)
}
