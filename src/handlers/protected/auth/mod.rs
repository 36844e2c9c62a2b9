use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::User;

/// GET /api/auth/current - The caller as identified by the session token
pub async fn current(Extension(user): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(User::from(user)))
}
