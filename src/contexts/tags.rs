use serde::Serialize;

use super::query::{query_key, QueryCache, QueryResult};
use crate::database::models::Tag;
use crate::database::Store;
use crate::services::tags::{list_professors, list_subjects, list_trails};

#[derive(Debug, Clone, Serialize)]
pub struct TagsSnapshot {
    pub trails: QueryResult<Vec<Tag>>,
    pub professors: QueryResult<Vec<Tag>>,
    pub subjects: QueryResult<Vec<Tag>>,
}

/// Shared vocabulary lists under the keys `["trails"]`, `["professors"]`
/// and `["subjects"]`.
#[derive(Default)]
pub struct TagsContext {
    cache: QueryCache<Vec<Tag>>,
}

impl TagsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn trails(&self, store: &dyn Store) -> QueryResult<Vec<Tag>> {
        self.cache.fetch(query_key(&["trails"]), || list_trails(store)).await
    }

    pub async fn professors(&self, store: &dyn Store) -> QueryResult<Vec<Tag>> {
        self.cache.fetch(query_key(&["professors"]), || list_professors(store)).await
    }

    pub async fn subjects(&self, store: &dyn Store) -> QueryResult<Vec<Tag>> {
        self.cache.fetch(query_key(&["subjects"]), || list_subjects(store)).await
    }

    pub async fn snapshot(&self, store: &dyn Store) -> TagsSnapshot {
        let (trails, professors, subjects) = tokio::join!(self.trails(store), self.professors(store), self.subjects(store));
        TagsSnapshot { trails, professors, subjects }
    }

    pub async fn refetch(&self, store: &dyn Store) -> TagsSnapshot {
        for key in ["trails", "professors", "subjects"] {
            self.cache.invalidate(&query_key(&[key])).await;
        }
        self.snapshot(store).await
    }
}
