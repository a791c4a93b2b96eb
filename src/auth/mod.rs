pub mod password;
pub mod session;

use serde::Serialize;
use uuid::Uuid;

pub use password::{PasswordError, PasswordHashing};
pub use session::{IssuedSession, Session, SessionError, SessionIssuer};

/// Who a successful credential check resolved to. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: String,
}
