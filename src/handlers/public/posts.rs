use axum::extract::{Path, RawQuery, State};

use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, OptionalSession};
use crate::services::projects;
use crate::services::views::{Post, ProjectDetails};
use crate::state::AppState;

/// GET /api/posts - every published project, newest first
pub async fn posts_get(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    Ok(ApiResponse::success(projects::fetch_posts(state.store()).await?))
}

/// GET /api/posts/filter?semester=&publishedYear=&subjectId=
pub async fn posts_filter_get(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Vec<Post>> {
    let posts = projects::filter_posts(state.store(), query.as_deref().unwrap_or_default()).await?;
    Ok(ApiResponse::success(posts))
}

/// GET /api/posts/search?title=&tag=&professorName=
pub async fn posts_search_get(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Vec<Post>> {
    let posts = projects::search_posts(state.store(), query.as_deref().unwrap_or_default()).await?;
    Ok(ApiResponse::success(posts))
}

/// GET /api/projects/:id - drafts are only visible to their author
pub async fn project_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalSession(session): OptionalSession,
) -> ApiResult<ProjectDetails> {
    let id = parse_id(&id, "project")?;
    let viewer = session.map(|s| s.id);
    Ok(ApiResponse::success(projects::get_project_details(state.store(), id, viewer).await?))
}
