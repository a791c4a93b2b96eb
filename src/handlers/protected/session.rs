use axum::Extension;

use crate::auth::Session;
use crate::middleware::ApiResponse;

/// GET /api/auth/session - the decoded session behind this request
pub async fn session_get(Extension(session): Extension<Session>) -> ApiResponse<Session> {
    ApiResponse::success(session)
}
