use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row shape shared by the trails, subjects and professors vocabularies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    #[serde(rename(serialize = "createdAt"))]
    pub created_at: DateTime<Utc>,
}
