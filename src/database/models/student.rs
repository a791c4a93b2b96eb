use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub email: String,
    /// argon2 PHC string, never serialized out
    #[serde(skip_serializing)]
    pub password: String,
    pub username: String,
    pub name: String,
    pub semester: i32,
    pub about: Option<String>,
    pub profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentTrail {
    pub student_id: Uuid,
    pub trail_id: Uuid,
}
