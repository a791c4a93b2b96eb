use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, OptionalSession};
use crate::services::students::{self, RegisterForm};
use crate::services::views::StudentView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub student: Identity,
}

/// POST /auth/register - create a student account
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> ApiResult<StudentView> {
    let Json(form) = payload?;
    let student = students::register(state.store(), &state.hashing, form).await?;
    Ok(ApiResponse::created(student))
}

/// POST /auth/login - check credentials, set the session cookie and return
/// the token for bearer use
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let identity = students::authenticate_student(state.store(), &state.hashing, request.email.trim(), &request.password).await?;
    let issued = state.sessions.issue(&identity)?;
    tracing::info!("Student {} signed in", identity.username);

    let cookie = state.sessions.cookie(&issued);
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ApiResponse::success(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            student: identity,
        }),
    ))
}

/// POST /auth/logout - clear the cookie and forget the cached profile.
/// Tokens are stateless, so a copied token stays valid until it expires.
pub async fn logout_post(State(state): State<AppState>, OptionalSession(session): OptionalSession) -> impl IntoResponse {
    if let Some(session) = &session {
        state.contexts.student.invalidate(&session.username).await;
        tracing::info!("Student {} signed out", session.username);
    }
    (
        AppendHeaders([(SET_COOKIE, state.sessions.clear_cookie())]),
        ApiResponse::success(json!({ "loggedOut": true })),
    )
}
