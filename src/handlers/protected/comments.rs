use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::auth::Session;
use crate::database::models::{Comment, Report};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::comments::{self, CommentForm};
use crate::state::AppState;

/// POST /api/projects/:id/comments
pub async fn comment_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(project_id): Path<String>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> ApiResult<Comment> {
    let project_id = parse_id(&project_id, "project")?;
    let Json(form) = payload?;
    let comment = comments::create_comment(state.store(), project_id, session.id, &form.content).await?;
    Ok(ApiResponse::created(comment))
}

/// DELETE /api/comments/:id - author only
pub async fn comment_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "comment")?;
    comments::delete_comment(state.store(), id, session.id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// POST /api/comments/:id/reports - body `{ "content": reason }`
pub async fn report_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(comment_id): Path<String>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> ApiResult<Report> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let Json(form) = payload?;
    let report = comments::report_comment(state.store(), comment_id, session.id, &form.content).await?;
    Ok(ApiResponse::created(report))
}
