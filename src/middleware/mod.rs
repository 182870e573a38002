pub mod auth;
pub mod response;

pub use auth::{extract_credential, require_auth, CurrentUser};
pub use response::{ApiResponse, ApiResult};
