// Protected handlers: `require_session` has already put a `Session` in the
// request extensions.
pub mod comments;
pub mod drafts;
pub mod me;
pub mod projects;
pub mod session;

use serde::Deserialize;

use crate::auth::Session;
use crate::state::AppState;

/// `?filename=` for raw-body uploads
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// Reload the caller's cached profile after a write that changes it
pub(crate) async fn refresh_profile(state: &AppState, session: &Session) {
    let result = state.contexts.student.refetch(state.store(), Some(&session.username)).await;
    if !result.is_success() {
        tracing::warn!("Profile refresh for {} failed: {:?}", session.username, result.error);
    }
}
