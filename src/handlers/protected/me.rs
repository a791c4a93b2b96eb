use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};

use super::{refresh_profile, UploadQuery};
use crate::auth::Session;
use crate::contexts::QueryResult;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::students::{self, EditProfileForm};
use crate::services::views::Profile;
use crate::state::AppState;

/// GET /api/me - the signed-in student's cached profile
pub async fn me_get(State(state): State<AppState>, Extension(session): Extension<Session>) -> ApiResponse<QueryResult<Profile>> {
    ApiResponse::success(state.contexts.student.student(state.store(), Some(&session.username)).await)
}

/// POST /api/me/refetch
pub async fn me_refetch_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResponse<QueryResult<Profile>> {
    ApiResponse::success(state.contexts.student.refetch(state.store(), Some(&session.username)).await)
}

/// PUT /api/students/me - semester, about and trails
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<EditProfileForm>, JsonRejection>,
) -> ApiResult<QueryResult<Profile>> {
    let Json(form) = payload?;
    students::edit_profile(state.store(), session.id, form).await?;
    Ok(ApiResponse::success(state.contexts.student.refetch(state.store(), Some(&session.username)).await))
}

/// PUT /api/students/me/avatar?filename= - raw image body
pub async fn avatar_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Value> {
    let Query(query) = query?;
    let url = students::upload_profile_image(state.store(), state.objects(), &session.username, &query.filename, body.to_vec()).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::success(json!({ "profileUrl": url })))
}
