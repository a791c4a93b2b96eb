use axum::extract::State;

use crate::contexts::TagsSnapshot;
use crate::database::models::Tag;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tags;
use crate::state::AppState;

/// GET /api/tags - cached trails, professors and subjects
pub async fn tags_get(State(state): State<AppState>) -> ApiResponse<TagsSnapshot> {
    ApiResponse::success(state.contexts.tags.snapshot(state.store()).await)
}

/// POST /api/tags/refetch
pub async fn tags_refetch_post(State(state): State<AppState>) -> ApiResponse<TagsSnapshot> {
    ApiResponse::success(state.contexts.tags.refetch(state.store()).await)
}

pub async fn trails_get(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    Ok(ApiResponse::success(tags::list_trails(state.store()).await?))
}

pub async fn subjects_get(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    Ok(ApiResponse::success(tags::list_subjects(state.store()).await?))
}

pub async fn professors_get(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    Ok(ApiResponse::success(tags::list_professors(state.store()).await?))
}
