//! Response projections assembled from store rows. Field names are the
//! camelCase names UI clients consume.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Project, Student};
use crate::types::ProjectStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub name: String,
    pub username: String,
    pub profile_url: Option<String>,
}

/// A project as it appears in listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub published_year: i32,
    pub status: ProjectStatus,
    pub semester: i32,
    pub allow_comments: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: AuthorSummary,
    pub subject_id: Option<Uuid>,
    pub subject: Option<String>,
    pub trails: Vec<String>,
    pub professors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub post: Post,
    pub content: Option<String>,
    pub comments: Vec<CommentView>,
}

/// An editable draft with the raw tag ids the edit form needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub content: Option<String>,
    pub published_year: i32,
    pub semester: i32,
    pub allow_comments: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subject_id: Option<Uuid>,
    pub trails_ids: Vec<Uuid>,
    pub professors_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSummary {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePost {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub published_year: i32,
    pub semester: i32,
    pub subject: Option<String>,
    pub subject_id: Option<Uuid>,
    pub trails: Vec<String>,
    pub professors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for ProfilePost {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            banner_url: post.banner_url,
            published_year: post.published_year,
            semester: post.semester,
            subject: post.subject,
            subject_id: post.subject_id,
            trails: post.trails,
            professors: post.professors,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub semester: i32,
    pub about: Option<String>,
    pub profile_url: Option<String>,
    pub trails: Vec<String>,
    pub posts: Vec<ProfilePost>,
    pub drafts: Vec<DraftSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSearchResult {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub semester: i32,
    pub profile_url: Option<String>,
    pub trails: Vec<String>,
}

/// A student without credentials, returned by registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: String,
    pub semester: i32,
    pub about: Option<String>,
    pub profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for StudentView {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            email: student.email,
            username: student.username,
            name: student.name,
            semester: student.semester,
            about: student.about,
            profile_url: student.profile_url,
            created_at: student.created_at,
        }
    }
}

impl Draft {
    pub fn from_project(project: Project, trails_ids: Vec<Uuid>, professors_ids: Vec<Uuid>) -> Self {
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            banner_url: project.banner_url,
            content: project.content,
            published_year: project.published_year,
            semester: project.semester,
            allow_comments: project.allow_comments,
            created_at: project.created_at,
            updated_at: project.updated_at,
            subject_id: project.subject_id,
            trails_ids,
            professors_ids,
        }
    }
}
