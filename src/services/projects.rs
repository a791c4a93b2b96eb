use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::students::escape_like;
use super::tags::{names_by_id, PROJECT_PROFESSORS, PROJECT_TRAILS};
use super::views::{AuthorSummary, CommentView, Post, ProjectDetails};
use super::{distinct, query_pairs, require_text, ServiceError, ServiceResult};
use crate::database::models::{Comment, Project};
use crate::database::{row, Repository, Row, Store, Table, WriteBatch, WriteOp};
use crate::filter::FilterData;
use crate::storage::{self, ObjectStore, PROJECT_BANNERS_BUCKET};
use crate::types::ProjectStatus;

/// Project fields as submitted by the publish and draft forms
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub published_year: i32,
    pub semester: i32,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    pub subject_id: Option<Uuid>,
    pub trails_ids: Option<Vec<Uuid>>,
    pub professors_ids: Option<Vec<Uuid>>,
}

fn default_true() -> bool {
    true
}

impl ProjectForm {
    pub(crate) fn validate(&self) -> ServiceResult<()> {
        require_text("Title", &self.title)?;
        require_text("Description", &self.description)?;
        if self.semester < 1 {
            return Err(ServiceError::Validation("Semester must be positive".to_string()));
        }
        if self.published_year < 1 {
            return Err(ServiceError::Validation("Published year must be positive".to_string()));
        }
        Ok(())
    }

    /// Columns every save overwrites. Status and author are set by the caller.
    pub(crate) fn columns(&self) -> Row {
        row(json!({
            "title": self.title.trim(),
            "description": self.description,
            "content": self.content,
            "published_year": self.published_year,
            "semester": self.semester,
            "allow_comments": self.allow_comments,
            "subject_id": self.subject_id,
        }))
    }

    /// Junction replacement for both tag sets
    pub(crate) fn replace_tag_ops(&self, project_id: Uuid) -> Vec<WriteOp> {
        let mut ops = PROJECT_TRAILS.replace_ops(project_id, self.trails_ids.as_deref());
        ops.extend(PROJECT_PROFESSORS.replace_ops(project_id, self.professors_ids.as_deref()));
        ops
    }

    pub(crate) fn link_tag_ops(&self, project_id: Uuid) -> Vec<WriteOp> {
        let mut ops = PROJECT_TRAILS.link_ops(project_id, self.trails_ids.as_deref());
        ops.extend(PROJECT_PROFESSORS.link_ops(project_id, self.professors_ids.as_deref()));
        ops
    }

    /// Batch inserting a brand new project with its tags
    pub(crate) fn insert_batch(&self, project_id: Uuid, author_id: Uuid, status: ProjectStatus) -> WriteBatch {
        let mut columns = self.columns();
        columns.insert("id".to_string(), json!(project_id));
        columns.insert("author_id".to_string(), json!(author_id));
        columns.insert("status".to_string(), json!(status));
        WriteBatch::new()
            .push(WriteOp::insert_one(Table::Projects, columns))
            .extend(self.link_tag_ops(project_id))
    }
}

fn projects(store: &dyn Store) -> Repository<'_, Project> {
    Repository::new(Table::Projects, store)
}

/// Author columns only; the password hash is never loaded for a listing.
#[derive(Debug, Deserialize)]
struct AuthorRow {
    id: Uuid,
    name: String,
    username: String,
    profile_url: Option<String>,
}

pub(crate) async fn authors_by_id(store: &dyn Store, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, AuthorSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<AuthorRow> = Repository::new(Table::Students, store)
        .select_any(FilterData::where_(json!({ "id": { "$in": ids } })).columns(&["id", "name", "username", "profile_url"]))
        .await?;
    Ok(rows
        .into_iter()
        .map(|a| (a.id, AuthorSummary { name: a.name, username: a.username, profile_url: a.profile_url }))
        .collect())
}

/// Expand project rows into posts. Authors, subjects, trails and professors
/// are each fetched once for the whole set, then stitched back in order.
pub(crate) async fn build_posts(store: &dyn Store, rows: Vec<Project>) -> ServiceResult<Vec<Post>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let author_ids = distinct(rows.iter().map(|p| p.author_id));
    let subject_ids = distinct(rows.iter().filter_map(|p| p.subject_id));

    let (mut trails, mut professors, authors, subjects) = futures::try_join!(
        PROJECT_TRAILS.names_by_owner(store, &ids),
        PROJECT_PROFESSORS.names_by_owner(store, &ids),
        authors_by_id(store, &author_ids),
        names_by_id(store, Table::Subjects, &subject_ids),
    )?;

    rows.into_iter()
        .map(|p| {
            let author = authors
                .get(&p.author_id)
                .cloned()
                .ok_or_else(|| ServiceError::NotFound(format!("Author {}", p.author_id)))?;
            Ok(Post {
                subject: p.subject_id.and_then(|id| subjects.get(&id).cloned()),
                trails: trails.remove(&p.id).unwrap_or_default(),
                professors: professors.remove(&p.id).unwrap_or_default(),
                id: p.id,
                title: p.title,
                description: p.description,
                banner_url: p.banner_url,
                published_year: p.published_year,
                status: p.status,
                semester: p.semester,
                allow_comments: p.allow_comments,
                created_at: p.created_at,
                updated_at: p.updated_at,
                author_id: p.author_id,
                author,
                subject_id: p.subject_id,
            })
        })
        .collect()
}

async fn published(store: &dyn Store, mut conditions: Map<String, Value>) -> ServiceResult<Vec<Project>> {
    conditions.insert("status".to_string(), json!(ProjectStatus::Published));
    Ok(projects(store)
        .select_any(FilterData::where_(Value::Object(conditions)).order_by("created_at desc"))
        .await?)
}

/// Every published project, newest first
pub async fn fetch_posts(store: &dyn Store) -> ServiceResult<Vec<Post>> {
    let rows = published(store, Map::new()).await?;
    build_posts(store, rows).await
}

/// Published projects matching `semester`, `publishedYear` and `subjectId`
/// from a query string. Present filters are ANDed; empty ones are ignored.
pub async fn filter_posts(store: &dyn Store, query: &str) -> ServiceResult<Vec<Post>> {
    let mut conditions = Map::new();
    for (key, value) in query_pairs(query) {
        match key.as_str() {
            "semester" => {
                conditions.insert("semester".to_string(), json!(parse_number(&key, &value)?));
            }
            "publishedYear" => {
                conditions.insert("published_year".to_string(), json!(parse_number(&key, &value)?));
            }
            "subjectId" => {
                let id = Uuid::parse_str(&value)
                    .map_err(|_| ServiceError::Validation(format!("subjectId is not a valid id: {}", value)))?;
                conditions.insert("subject_id".to_string(), json!(id));
            }
            _ => {}
        }
    }
    let rows = published(store, conditions).await?;
    build_posts(store, rows).await
}

fn parse_number(key: &str, value: &str) -> ServiceResult<i32> {
    value
        .parse::<i32>()
        .map_err(|_| ServiceError::Validation(format!("{} must be a number: {}", key, value)))
}

/// Published projects by `title` fragment, exact trail name (`tag`) and
/// professor name fragment (`professorName`).
pub async fn search_posts(store: &dyn Store, query: &str) -> ServiceResult<Vec<Post>> {
    let params: HashMap<String, String> = query_pairs(query).into_iter().collect();

    let mut conditions = Map::new();
    if let Some(title) = params.get("title") {
        conditions.insert("title".to_string(), json!({ "$ilike": format!("%{}%", escape_like(title)) }));
    }
    let rows = published(store, conditions).await?;
    let posts = build_posts(store, rows).await?;

    let tag = params.get("tag");
    let professor = params.get("professorName").map(|p| p.to_lowercase());
    Ok(posts
        .into_iter()
        .filter(|post| tag.map(|t| post.trails.iter().any(|name| name == t)).unwrap_or(true))
        .filter(|post| {
            professor
                .as_ref()
                .map(|needle| post.professors.iter().any(|name| name.to_lowercase().contains(needle.as_str())))
                .unwrap_or(true)
        })
        .collect())
}

/// Full project view. A draft is only visible to its author.
pub async fn get_project_details(store: &dyn Store, id: Uuid, viewer: Option<Uuid>) -> ServiceResult<ProjectDetails> {
    let project = projects(store)
        .select_one(FilterData::where_(json!({ "id": id })))
        .await?
        .filter(|p| p.status == ProjectStatus::Published || Some(p.author_id) == viewer)
        .ok_or_else(|| ServiceError::NotFound("Project".to_string()))?;

    let content = project.content.clone();
    let comments: Vec<Comment> = Repository::new(Table::Comments, store)
        .select_any(FilterData::where_(json!({ "project_id": id })).order_by("created_at desc"))
        .await?;

    let commenter_ids = distinct(comments.iter().map(|c| c.author_id));
    let (mut posts, commenters) = futures::try_join!(build_posts(store, vec![project]), authors_by_id(store, &commenter_ids))?;
    let post = posts.pop().ok_or_else(|| ServiceError::NotFound("Project".to_string()))?;

    let comments = comments
        .into_iter()
        .map(|c| {
            let author = commenters
                .get(&c.author_id)
                .cloned()
                .ok_or_else(|| ServiceError::NotFound(format!("Author {}", c.author_id)))?;
            Ok(CommentView {
                id: c.id,
                content: c.content,
                created_at: c.created_at,
                updated_at: c.updated_at,
                author_id: c.author_id,
                author,
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(ProjectDetails { post, content, comments })
}

/// Publish a project. With `draft_id` the author's draft is promoted in
/// place (same id); without, a new published row is created. Either way the
/// row and both tag sets are written in one batch.
pub async fn publish_project(
    store: &dyn Store,
    form: ProjectForm,
    author_id: Uuid,
    draft_id: Option<Uuid>,
) -> ServiceResult<Uuid> {
    form.validate()?;

    let (id, batch) = match draft_id {
        Some(draft_id) => {
            let mut changes = form.columns();
            changes.insert("status".to_string(), json!(ProjectStatus::Published));
            let batch = WriteBatch::new()
                .push(WriteOp::update_existing(
                    Table::Projects,
                    json!({ "id": draft_id, "status": ProjectStatus::Draft, "author_id": author_id }),
                    changes,
                ))
                .extend(form.replace_tag_ops(draft_id));
            (draft_id, batch)
        }
        None => {
            let id = Uuid::new_v4();
            (id, form.insert_batch(id, author_id, ProjectStatus::Published))
        }
    };

    store.execute(batch).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::NotFound(_) => ServiceError::NotFound("Draft".to_string()),
        other => other,
    })?;
    tracing::info!("Published project {} by {}", id, author_id);
    Ok(id)
}

/// Delete a project the actor authored. Tags and comments go with it.
pub async fn delete_project(store: &dyn Store, id: Uuid, actor: Uuid) -> ServiceResult<()> {
    let project = projects(store)
        .select_one(FilterData::where_(json!({ "id": id })))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project".to_string()))?;
    if project.author_id != actor {
        return Err(ServiceError::Forbidden("Only the author can delete this project".to_string()));
    }

    store.delete(Table::Projects, json!({ "id": id, "author_id": actor })).await?;
    tracing::info!("Deleted project {}", id);
    Ok(())
}

/// Store the banner under `banners/{project_id}.{ext}` and point the
/// project's banner_url at it. Returns the public URL.
pub async fn upload_project_banner(
    store: &dyn Store,
    objects: &dyn ObjectStore,
    project_id: Uuid,
    actor: Uuid,
    file_name: &str,
    bytes: Vec<u8>,
) -> ServiceResult<String> {
    let extension = storage::file_extension(file_name)?;
    let project = projects(store)
        .select_one(FilterData::where_(json!({ "id": project_id })))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project".to_string()))?;
    if project.author_id != actor {
        return Err(ServiceError::Forbidden("Only the author can change the banner".to_string()));
    }

    let path = storage::project_banner_path(project_id, &extension);
    objects
        .upload(PROJECT_BANNERS_BUCKET, &path, bytes, storage::content_type_for(&extension))
        .await?;

    let url = objects.public_url(PROJECT_BANNERS_BUCKET, &path);
    store
        .update(Table::Projects, json!({ "id": project_id }), row(json!({ "banner_url": url })))
        .await?;
    Ok(url)
}
