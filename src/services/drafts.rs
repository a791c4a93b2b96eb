use serde_json::json;
use uuid::Uuid;

use super::projects::ProjectForm;
use super::tags::{PROJECT_PROFESSORS, PROJECT_TRAILS};
use super::views::Draft;
use super::{ServiceError, ServiceResult};
use crate::database::models::Project;
use crate::database::{Repository, Store, Table, WriteBatch, WriteOp};
use crate::filter::FilterData;
use crate::types::ProjectStatus;

/// Create a DRAFT project with its tags. Returns the new id.
pub async fn create_draft(store: &dyn Store, form: ProjectForm, author_id: Uuid) -> ServiceResult<Uuid> {
    form.validate()?;
    let id = Uuid::new_v4();
    store.execute(form.insert_batch(id, author_id, ProjectStatus::Draft)).await?;
    tracing::info!("Created draft {} for {}", id, author_id);
    Ok(id)
}

/// Overwrite a draft in place and replace both tag sets. Only a DRAFT
/// owned by `actor` matches; anything else is NotFound and nothing is written.
pub async fn save_draft(store: &dyn Store, draft_id: Uuid, form: ProjectForm, actor: Uuid) -> ServiceResult<()> {
    form.validate()?;
    let batch = WriteBatch::new()
        .push(WriteOp::update_existing(
            Table::Projects,
            json!({ "id": draft_id, "status": ProjectStatus::Draft, "author_id": actor }),
            form.columns(),
        ))
        .extend(form.replace_tag_ops(draft_id));

    store.execute(batch).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::NotFound(_) => ServiceError::NotFound("Draft".to_string()),
        other => other,
    })?;
    tracing::info!("Saved draft {}", draft_id);
    Ok(())
}

/// Draft fields plus the raw trail and professor ids for editing.
pub async fn get_draft_details(store: &dyn Store, draft_id: Uuid, actor: Uuid) -> ServiceResult<Draft> {
    let draft = Repository::<Project>::new(Table::Projects, store)
        .select_one(FilterData::where_(json!({ "id": draft_id, "status": ProjectStatus::Draft })))
        .await?
        .filter(|p| p.author_id == actor)
        .ok_or_else(|| ServiceError::NotFound("Draft".to_string()))?;

    let (trails_ids, professors_ids) = futures::try_join!(
        PROJECT_TRAILS.ids_for(store, draft_id),
        PROJECT_PROFESSORS.ids_for(store, draft_id),
    )?;

    Ok(Draft::from_project(draft, trails_ids, professors_ids))
}
