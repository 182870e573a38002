use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::auth::cookie::logged_out_cookie;
use crate::middleware::{extract_credential, ApiResponse};
use crate::state::AppState;

/// GET /api/v1/auth/logout - Overwrite the cookie and revoke the presented token
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = extract_credential(&headers) {
        if let Ok(claims) = state.tokens.verify(&token) {
            state.denylist.revoke(claims.jti, claims.exp).await;
            tracing::info!("user {} logged out", claims.id);
        }
    }

    let jar = jar.add(logged_out_cookie(state.config.security.secure_cookies));
    (jar, ApiResponse::success(json!({})))
}
