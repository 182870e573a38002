use axum::Extension;
use serde::Serialize;

use crate::handlers::public::auth::UserData;
use crate::middleware::{ApiResponse, CurrentUser};

#[derive(Debug, Serialize)]
pub struct MeBody {
    data: UserData,
}

/// GET /api/v1/auth/me - The authenticated caller
pub async fn me(Extension(current): Extension<CurrentUser>) -> ApiResponse<MeBody> {
    ApiResponse::success(MeBody {
        data: UserData { user: current.user },
    })
}
