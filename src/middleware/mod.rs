pub mod auth;
pub mod response;

pub use auth::{require_session, session_from_headers, OptionalSession};
pub use response::{ApiResponse, ApiResult};
