use axum::extract::{Path, RawQuery, State};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::students;
use crate::services::views::{Profile, StudentSearchResult};
use crate::state::AppState;

/// GET /api/students?name= - name search
pub async fn students_get(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Vec<StudentSearchResult>> {
    let found = students::search_students(state.store(), query.as_deref().unwrap_or_default()).await?;
    Ok(ApiResponse::success(found))
}

/// GET /api/students/:username - public profile
pub async fn student_get(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Profile> {
    Ok(ApiResponse::success(students::get_student_profile(state.store(), &username).await?))
}
