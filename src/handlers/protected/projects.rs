use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{refresh_profile, UploadQuery};
use crate::auth::Session;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::projects::{self, ProjectForm};
use crate::state::AppState;

/// Publish body: the project form plus an optional draft to promote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(flatten)]
    pub form: ProjectForm,
    pub draft_id: Option<Uuid>,
}

/// POST /api/projects - publish, promoting `draftId` in place when given
pub async fn project_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    let id = projects::publish_project(state.store(), request.form, session.id, request.draft_id).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::created(json!({ "id": id })))
}

/// DELETE /api/projects/:id
pub async fn project_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "project")?;
    projects::delete_project(state.store(), id, session.id).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// PUT /api/projects/:id/banner?filename= - raw image body
pub async fn banner_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = parse_id(&id, "project")?;
    let Query(query) = query?;
    let url = projects::upload_project_banner(state.store(), state.objects(), id, session.id, &query.filename, body.to_vec()).await?;
    refresh_profile(&state, &session).await;
    Ok(ApiResponse::success(json!({ "bannerUrl": url })))
}
