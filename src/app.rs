use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::require_session;
use crate::state::AppState;

/// Full application router over `state`
pub fn router(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;

    let app = Router::new()
        .route("/", get(public::home::root))
        .route("/health", get(public::home::health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors_layer(&state.config.security.cors_origins));

    let app = if state.config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, posts, students, tags};

    Router::new()
        // Credentials and sessions
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/logout", post(auth::logout_post))
        // Published projects
        .route("/api/posts", get(posts::posts_get))
        .route("/api/posts/filter", get(posts::posts_filter_get))
        .route("/api/posts/search", get(posts::posts_search_get))
        .route("/api/projects/:id", get(posts::project_get))
        // Students
        .route("/api/students", get(students::students_get))
        .route("/api/students/:username", get(students::student_get))
        // Vocabularies
        .route("/api/tags", get(tags::tags_get))
        .route("/api/tags/refetch", post(tags::tags_refetch_post))
        .route("/api/trails", get(tags::trails_get))
        .route("/api/subjects", get(tags::subjects_get))
        .route("/api/professors", get(tags::professors_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{comments, drafts, me, projects, session};

    Router::new()
        .route("/api/auth/session", get(session::session_get))
        .route("/api/me", get(me::me_get))
        .route("/api/me/refetch", post(me::me_refetch_post))
        .route("/api/students/me", put(me::profile_put))
        .route("/api/students/me/avatar", put(me::avatar_put))
        .route("/api/projects", post(projects::project_post))
        .route("/api/projects/:id", delete(projects::project_delete))
        .route("/api/projects/:id/banner", put(projects::banner_put))
        .route("/api/projects/:id/comments", post(comments::comment_post))
        .route("/api/drafts", post(drafts::draft_post))
        .route("/api/drafts/:id", get(drafts::draft_get).put(drafts::draft_put))
        .route("/api/comments/:id", delete(comments::comment_delete))
        .route("/api/comments/:id/reports", post(comments::report_post))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

/// Cookie sessions need credentialed CORS, which rules out wildcard origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
