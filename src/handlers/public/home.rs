use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Showcase API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Student project showcase backend",
            "endpoints": {
                "auth": "/auth/register, /auth/login, /auth/logout (public)",
                "posts": "/api/posts[/filter|/search] (public)",
                "projects": "/api/projects[/:id] (read public, write protected)",
                "drafts": "/api/drafts[/:id] (protected)",
                "students": "/api/students[/:username] (public), /api/students/me (protected)",
                "tags": "/api/tags, /api/trails, /api/subjects, /api/professors (public)",
                "me": "/api/me, /api/auth/session (protected)",
            }
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store().health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
