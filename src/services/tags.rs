//! Tag vocabularies (trails, subjects, professors) and the junction tables
//! that attach them to students and projects.

use std::collections::HashMap;

use serde_json::json;
use uuid::Uuid;

use super::{distinct, uuid_column, ServiceResult};
use crate::database::models::Tag;
use crate::database::{row, Repository, Store, Table, WriteOp};
use crate::filter::FilterData;

/// One many-to-many association: `junction` rows pair an owner id with a tag id.
#[derive(Debug, Clone, Copy)]
pub struct TagLink {
    pub junction: Table,
    pub owner_column: &'static str,
    pub tag_column: &'static str,
    pub tags: Table,
}

pub const PROJECT_TRAILS: TagLink = TagLink {
    junction: Table::ProjectTrails,
    owner_column: "project_id",
    tag_column: "trail_id",
    tags: Table::Trails,
};

pub const PROJECT_PROFESSORS: TagLink = TagLink {
    junction: Table::ProjectProfessors,
    owner_column: "project_id",
    tag_column: "professor_id",
    tags: Table::Professors,
};

pub const STUDENT_TRAILS: TagLink = TagLink {
    junction: Table::StudentTrails,
    owner_column: "student_id",
    tag_column: "trail_id",
    tags: Table::Trails,
};

async fn list(store: &dyn Store, table: Table) -> ServiceResult<Vec<Tag>> {
    Ok(Repository::<Tag>::new(table, store)
        .select_any(FilterData::default().order_by("name asc"))
        .await?)
}

pub async fn list_trails(store: &dyn Store) -> ServiceResult<Vec<Tag>> {
    list(store, Table::Trails).await
}

pub async fn list_subjects(store: &dyn Store) -> ServiceResult<Vec<Tag>> {
    list(store, Table::Subjects).await
}

pub async fn list_professors(store: &dyn Store) -> ServiceResult<Vec<Tag>> {
    list(store, Table::Professors).await
}

impl TagLink {
    /// Tag ids attached to each owner, in junction order
    pub async fn ids_by_owner(&self, store: &dyn Store, owner_ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Vec<Uuid>>> {
        let mut by_owner: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if owner_ids.is_empty() {
            return Ok(by_owner);
        }
        let rows = store
            .select(self.junction, FilterData::where_(json!({ self.owner_column: { "$in": owner_ids } })))
            .await?;
        for r in &rows {
            by_owner.entry(uuid_column(r, self.owner_column)?).or_default().push(uuid_column(r, self.tag_column)?);
        }
        Ok(by_owner)
    }

    pub async fn ids_for(&self, store: &dyn Store, owner_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        Ok(self.ids_by_owner(store, &[owner_id]).await?.remove(&owner_id).unwrap_or_default())
    }

    /// Tag names attached to each owner, sorted by name. Two queries total:
    /// the junction rows for every owner, then the tags they reference.
    pub async fn names_by_owner(&self, store: &dyn Store, owner_ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Vec<String>>> {
        let ids = self.ids_by_owner(store, owner_ids).await?;
        let tag_ids = distinct(ids.values().flatten().copied());
        let names = names_by_id(store, self.tags, &tag_ids).await?;

        Ok(ids
            .into_iter()
            .map(|(owner, tag_ids)| {
                let mut owner_names: Vec<String> = tag_ids.iter().filter_map(|id| names.get(id).cloned()).collect();
                owner_names.sort();
                (owner, owner_names)
            })
            .collect())
    }

    pub async fn names_for(&self, store: &dyn Store, owner_id: Uuid) -> ServiceResult<Vec<String>> {
        Ok(self.names_by_owner(store, &[owner_id]).await?.remove(&owner_id).unwrap_or_default())
    }

    /// Junction inserts for a new owner. Duplicates collapse; an empty or
    /// absent list writes nothing.
    pub fn link_ops(&self, owner_id: Uuid, tag_ids: Option<&[Uuid]>) -> Vec<WriteOp> {
        let tag_ids = distinct(tag_ids.unwrap_or_default().iter().copied());
        if tag_ids.is_empty() {
            return vec![];
        }
        let rows = tag_ids
            .into_iter()
            .map(|tag_id| row(json!({ self.owner_column: owner_id, self.tag_column: tag_id })))
            .collect();
        vec![WriteOp::insert(self.junction, rows)]
    }

    /// Full replacement of an owner's tag set: delete everything, then link.
    pub fn replace_ops(&self, owner_id: Uuid, tag_ids: Option<&[Uuid]>) -> Vec<WriteOp> {
        let mut ops = vec![WriteOp::delete(self.junction, json!({ self.owner_column: owner_id }))];
        ops.extend(self.link_ops(owner_id, tag_ids));
        ops
    }
}

/// Names of the given tags keyed by id; one query regardless of count.
pub async fn names_by_id(store: &dyn Store, table: Table, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
    let tags = Repository::<Tag>::new(table, store).select_ids(ids).await?;
    Ok(tags.into_iter().map(|t| (t.id, t.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn vocabularies_list_in_name_order() {
        let fx = Fixture::new().await;
        let names: Vec<String> = list_trails(fx.store()).await.unwrap().into_iter().map(|t| t.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(list_subjects(fx.store()).await.unwrap().len(), fx.subjects.len());
        assert_eq!(list_professors(fx.store()).await.unwrap().len(), fx.professors.len());
    }

    #[test]
    fn link_ops_dedupe_and_skip_empty() {
        let owner = Uuid::new_v4();
        let tag = Uuid::new_v4();
        assert!(PROJECT_TRAILS.link_ops(owner, None).is_empty());
        assert!(PROJECT_TRAILS.link_ops(owner, Some(&[])).is_empty());

        let ops = PROJECT_TRAILS.link_ops(owner, Some(&[tag, tag]));
        match &ops[0] {
            WriteOp::Insert { rows, .. } => assert_eq!(rows.len(), 1),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn replace_always_clears_first() {
        let ops = PROJECT_PROFESSORS.replace_ops(Uuid::new_v4(), None);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], WriteOp::Delete { table: Table::ProjectProfessors, .. }));
    }
}
