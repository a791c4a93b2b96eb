// Two handler tiers:
// Public (no session required, some read one if present) and
// Protected (valid session required, injected by `require_session`).
pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, answering 400 rather than axum's plain-text rejection
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} id: {}", what, raw)))
}
