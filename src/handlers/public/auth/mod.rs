// handlers/public/auth/mod.rs - Credential acquisition
//
// Signup and login both answer with the signed token in the body and in
// the `jwt` cookie.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::auth::cookie::session_cookie;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::models::User;
use crate::state::AppState;

pub mod login;
pub mod logout;
pub mod signup;

pub use login::login;
pub use logout::logout;
pub use signup::signup;

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

#[derive(Debug, Serialize)]
struct TokenBody {
    token: String,
    data: UserData,
}

/// Issues a credential for `user` and sets it as the session cookie.
fn send_token(state: &AppState, jar: CookieJar, user: User, status: StatusCode) -> Result<Response, ApiError> {
    let issued = state.tokens.issue(user.id)?;
    let security = &state.config.security;
    let cookie = session_cookie(&issued.token, security.cookie_expiry_days, security.secure_cookies);

    let body = ApiResponse::with_status(
        TokenBody {
            token: issued.token,
            data: UserData { user },
        },
        status,
    );
    Ok((jar.add(cookie), body).into_response())
}
