use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ProjectStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub content: Option<String>,
    pub published_year: i32,
    pub semester: i32,
    pub status: ProjectStatus,
    #[serde(default = "default_allow_comments")]
    pub allow_comments: bool,
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_allow_comments() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTrail {
    pub project_id: Uuid,
    pub trail_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectProfessor {
    pub project_id: Uuid,
    pub professor_id: Uuid,
}
