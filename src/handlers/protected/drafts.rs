use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::refresh_profile;
use crate::auth::Session;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::drafts;
use crate::services::projects::ProjectForm;
use crate::services::views::Draft;
use crate::state::AppState;

/// POST /api/drafts
pub async fn draft_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ProjectForm>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(form) = payload?;
    let id = drafts::create_draft(state.store(), form, session.id).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::created(json!({ "id": id })))
}

/// GET /api/drafts/:id - author only
pub async fn draft_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Draft> {
    let id = parse_id(&id, "draft")?;
    Ok(ApiResponse::success(drafts::get_draft_details(state.store(), id, session.id).await?))
}

/// PUT /api/drafts/:id - overwrite fields and tag sets
pub async fn draft_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<ProjectForm>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "draft")?;
    let Json(form) = payload?;
    drafts::save_draft(state.store(), id, form, session.id).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::success(json!({ "id": id })))
}
