use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::cookie::{read_auth_cookie, LOGGED_OUT};
use crate::auth::Claims;
use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// Authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

/// Resolves the caller from the `jwt` cookie or a Bearer token and
/// rejects the request with 401 when that fails.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_credential(request.headers()).ok_or_else(|| ApiError::unauthorized(NOT_LOGGED_IN))?;
    if token == LOGGED_OUT {
        return Err(ApiError::unauthorized(NOT_LOGGED_IN));
    }

    let claims = state.tokens.verify(&token)?;

    if state.denylist.is_revoked(claims.jti).await {
        tracing::debug!("rejected revoked token {}", claims.jti);
        return Err(ApiError::unauthorized("This session has ended. Please log in again."));
    }

    let user = state
        .accounts
        .find(claims.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("The user belonging to this token no longer exists."))?;

    request.extensions_mut().insert(CurrentUser { user, claims });
    Ok(next.run(request).await)
}

/// Cookie first, then `Authorization: Bearer`.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = read_auth_cookie(headers) {
        return Some(token);
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("jwt=from-cookie"));
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_credential(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_credential(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_credential(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_credential(&headers), None);
        assert_eq!(extract_credential(&HeaderMap::new()), None);
    }

    #[test]
    fn sentinel_cookie_is_still_the_credential() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("jwt=loggedout"));
        headers.insert("authorization", HeaderValue::from_static("Bearer real-token"));
        assert_eq!(extract_credential(&headers).as_deref(), Some(LOGGED_OUT));
    }
}
