use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{require_text, ServiceError, ServiceResult};
use crate::database::models::{Comment, Project, Report};
use crate::database::{decode_row, row, Repository, Store, Table};
use crate::filter::FilterData;
use crate::types::ProjectStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

/// Comment on a published project that allows comments.
pub async fn create_comment(store: &dyn Store, project_id: Uuid, author_id: Uuid, content: &str) -> ServiceResult<Comment> {
    require_text("Comment", content)?;
    let project = Repository::<Project>::new(Table::Projects, store)
        .select_one(FilterData::where_(json!({ "id": project_id, "status": ProjectStatus::Published })))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project".to_string()))?;
    if !project.allow_comments {
        return Err(ServiceError::Forbidden("Comments are disabled for this project".to_string()));
    }

    let inserted = store
        .insert(
            Table::Comments,
            row(json!({ "id": Uuid::new_v4(), "project_id": project_id, "author_id": author_id, "content": content.trim() })),
        )
        .await?;
    let comment: Comment = decode_row(inserted)?;
    tracing::info!("Comment {} added to project {}", comment.id, project_id);
    Ok(comment)
}

/// Remove a comment the actor wrote. Reports against it are kept.
pub async fn delete_comment(store: &dyn Store, comment_id: Uuid, actor: Uuid) -> ServiceResult<()> {
    let comment = Repository::<Comment>::new(Table::Comments, store)
        .select_one(FilterData::where_(json!({ "id": comment_id })))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Comment".to_string()))?;
    if comment.author_id != actor {
        return Err(ServiceError::Forbidden("Only the author can delete this comment".to_string()));
    }
    store.delete(Table::Comments, json!({ "id": comment_id })).await?;
    Ok(())
}

/// Append a report against an existing comment.
pub async fn report_comment(store: &dyn Store, comment_id: Uuid, reporter_id: Uuid, content: &str) -> ServiceResult<Report> {
    require_text("Report", content)?;
    Repository::<Comment>::new(Table::Comments, store)
        .select_one(FilterData::where_(json!({ "id": comment_id })))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Comment".to_string()))?;

    let inserted = store
        .insert(
            Table::Reports,
            row(json!({ "id": Uuid::new_v4(), "comment_id": comment_id, "reporter_id": reporter_id, "content": content.trim() })),
        )
        .await?;
    let report: Report = decode_row(inserted)?;
    tracing::info!("Comment {} reported by {}", comment_id, reporter_id);
    Ok(report)
}
