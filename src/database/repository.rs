use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{Row, Store, Table};
use crate::filter::FilterData;

/// Typed reads over one table of a `Store`
pub struct Repository<'a, T> {
    table: Table,
    store: &'a dyn Store,
    _phantom: std::marker::PhantomData<T>,
}

impl<'a, T> Repository<'a, T>
where
    T: DeserializeOwned,
{
    pub fn new(table: Table, store: &'a dyn Store) -> Self {
        Self {
            table,
            store,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.store
            .select(self.table, filter_data)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    pub async fn select_one(&self, mut filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        filter_data.limit = Some(1);
        Ok(self.select_any(filter_data).await?.into_iter().next())
    }

    /// Fetch every row whose id is in `ids`; one query regardless of count.
    pub async fn select_ids(&self, ids: &[Uuid]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.select_any(FilterData::where_(json!({ "id": { "$in": ids } }))).await
    }
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, DatabaseError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DatabaseError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::Tag;
    use crate::database::store::row;

    #[tokio::test]
    async fn select_one_is_none_for_missing_rows() {
        let store = MemoryStore::new();
        let repo = Repository::<Tag>::new(Table::Trails, &store);
        assert!(repo.select_one(FilterData::where_(json!({ "name": "none" }))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn select_ids_fetches_in_one_pass() {
        let store = MemoryStore::new();
        let a = store.insert(Table::Professors, row(json!({ "name": "Turing" }))).await.unwrap();
        store.insert(Table::Professors, row(json!({ "name": "Hopper" }))).await.unwrap();
        let id: Uuid = a["id"].as_str().unwrap().parse().unwrap();

        let repo = Repository::<Tag>::new(Table::Professors, &store);
        let found = repo.select_ids(&[id]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Turing");
        assert!(repo.select_ids(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn decode_reports_shape_errors() {
        let err = decode_row::<Tag>(row(json!({ "name": 3 }))).unwrap_err();
        assert!(matches!(err, DatabaseError::Decode(_)));
    }
}
