use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{Row, Store, Table, WriteBatch, WriteOp};
use crate::filter::{Filter, FilterData, FilterMatch};

/// In-process store with the same contract as `PgStore`: unique keys,
/// foreign keys with cascades, and all-or-nothing write batches.
pub struct MemoryStore {
    state: RwLock<State>,
    max_limit: Option<i32>,
}

#[derive(Clone)]
struct State {
    tables: HashMap<Table, Vec<Row>>,
    last_timestamp: DateTime<Utc>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                tables: Table::ALL.iter().map(|t| (*t, Vec::new())).collect(),
                last_timestamp: DateTime::<Utc>::MIN_UTC,
            }),
            max_limit: None,
        }
    }

    pub fn with_max_limit(mut self, max_limit: Option<i32>) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// All rows of a table in insertion order
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.state.read().await.tables.get(&table).cloned().unwrap_or_default()
    }

    pub async fn count(&self, table: Table) -> usize {
        self.state.read().await.tables.get(&table).map(|rows| rows.len()).unwrap_or(0)
    }
}

impl State {
    /// Strictly increasing, so rows written back to back still order by time.
    fn next_timestamp(&mut self) -> String {
        let mut now = Utc::now();
        if now <= self.last_timestamp {
            now = self.last_timestamp + Duration::microseconds(1);
        }
        self.last_timestamp = now;
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn table(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(|rows| rows.as_slice()).unwrap_or(&[])
    }

    fn table_mut(&mut self, table: Table) -> &mut Vec<Row> {
        self.tables.entry(table).or_default()
    }

    fn apply(&mut self, op: WriteOp) -> Result<Vec<Row>, DatabaseError> {
        match op {
            WriteOp::Insert { table, rows } => self.insert(table, rows),
            WriteOp::Update { table, filter, changes, must_match } => {
                let rows = self.update(table, &filter, changes)?;
                if must_match && rows.is_empty() {
                    return Err(DatabaseError::NotFound(format!("{} matching {}", table, filter)));
                }
                Ok(rows)
            }
            WriteOp::Delete { table, filter } => self.delete(table, &filter),
        }
    }

    fn insert(&mut self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError> {
        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            if table.has_id() && !row.get("id").map(|v| !v.is_null()).unwrap_or(false) {
                row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            let now = self.next_timestamp();
            row.entry("created_at").or_insert_with(|| Value::String(now.clone()));
            if table.has_updated_at() {
                row.entry("updated_at").or_insert_with(|| Value::String(now));
            }

            self.check_unique(table, &row, None)?;
            self.check_foreign_keys(table, &row)?;
            self.table_mut(table).push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    fn update(&mut self, table: Table, filter: &Value, changes: Row) -> Result<Vec<Row>, DatabaseError> {
        let matching = self.matching_positions(table, filter)?;
        let mut updated = Vec::with_capacity(matching.len());

        for position in matching {
            let mut row = self.table(table)[position].clone();
            for (column, value) in &changes {
                row.insert(column.clone(), value.clone());
            }
            if table.has_updated_at() && !changes.contains_key("updated_at") {
                let now = self.next_timestamp();
                row.insert("updated_at".to_string(), Value::String(now));
            }

            self.check_unique(table, &row, Some(position))?;
            self.check_foreign_keys(table, &row)?;
            self.table_mut(table)[position] = row.clone();
            updated.push(row);
        }
        Ok(updated)
    }

    fn delete(&mut self, table: Table, filter: &Value) -> Result<Vec<Row>, DatabaseError> {
        let matching: HashSet<usize> = self.matching_positions(table, filter)?.into_iter().collect();
        let rows = self.table_mut(table);
        let mut deleted = Vec::with_capacity(matching.len());
        let mut kept = Vec::with_capacity(rows.len());
        for (position, row) in std::mem::take(rows).into_iter().enumerate() {
            if matching.contains(&position) {
                deleted.push(row);
            } else {
                kept.push(row);
            }
        }
        *rows = kept;

        if table.has_id() && !deleted.is_empty() {
            let ids: Vec<Value> = deleted.iter().filter_map(|r| r.get("id").cloned()).collect();
            self.cascade(table, &ids)?;
        }
        Ok(deleted)
    }

    /// Apply ON DELETE behaviour of every key that references `parent`.
    fn cascade(&mut self, parent: Table, ids: &[Value]) -> Result<(), DatabaseError> {
        for child in Table::ALL {
            for fk in child.foreign_keys().iter().filter(|fk| fk.references == parent) {
                let referencing = self
                    .table(child)
                    .iter()
                    .any(|row| row.get(fk.column).map(|v| ids.contains(v)).unwrap_or(false));
                if !referencing {
                    continue;
                }
                if !fk.on_delete_cascade {
                    return Err(DatabaseError::Constraint(format!(
                        "{}.{} still references {}",
                        child, fk.column, parent
                    )));
                }
                let mut filter = Row::new();
                filter.insert(fk.column.to_string(), serde_json::json!({ "$in": ids }));
                self.delete(child, &Value::Object(filter))?;
            }
        }
        Ok(())
    }

    fn matching_positions(&self, table: Table, filter: &Value) -> Result<Vec<usize>, DatabaseError> {
        let mut positions = Vec::new();
        for (position, row) in self.table(table).iter().enumerate() {
            if FilterMatch::matches(filter, row)? {
                positions.push(position);
            }
        }
        Ok(positions)
    }

    fn check_unique(&self, table: Table, row: &Row, skip: Option<usize>) -> Result<(), DatabaseError> {
        let id_key: &[&str] = &["id"];
        let keys = table
            .unique_keys()
            .iter()
            .copied()
            .chain(table.has_id().then_some(id_key));

        for key in keys {
            let values: Vec<&Value> = key.iter().map(|c| row.get(*c).unwrap_or(&Value::Null)).collect();
            if values.iter().any(|v| v.is_null()) {
                continue;
            }
            let clash = self.table(table).iter().enumerate().any(|(position, other)| {
                Some(position) != skip && key.iter().zip(&values).all(|(c, v)| other.get(*c) == Some(*v))
            });
            if clash {
                return Err(DatabaseError::Constraint(format!(
                    "duplicate key value violates unique constraint on {} ({})",
                    table,
                    key.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn check_foreign_keys(&self, table: Table, row: &Row) -> Result<(), DatabaseError> {
        for fk in table.foreign_keys() {
            let Some(value) = row.get(fk.column).filter(|v| !v.is_null()) else {
                continue;
            };
            let exists = self.table(fk.references).iter().any(|r| r.get("id") == Some(value));
            if !exists {
                return Err(DatabaseError::Constraint(format!(
                    "{}.{} references missing {} {}",
                    table, fk.column, fk.references, value
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: Table, filter_data: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let mut filter = Filter::new(table.name())?.with_max_limit(self.max_limit);
        filter.assign(filter_data)?;

        let state = self.state.read().await;
        let mut rows = Vec::new();
        for row in state.table(table) {
            let keep = match filter.where_data() {
                Some(where_data) => FilterMatch::matches(where_data, row)?,
                None => true,
            };
            if keep {
                rows.push(row.clone());
            }
        }
        drop(state);

        FilterMatch::sort(&mut rows, filter.order_data());

        let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
        let rows = rows.into_iter().skip(offset);
        let mut rows: Vec<Row> = match filter.effective_limit() {
            Some(limit) => rows.take(limit.max(0) as usize).collect(),
            None => rows.collect(),
        };

        let columns = filter.select_columns();
        if !columns.is_empty() && !columns.iter().any(|c| c == "*") {
            for row in rows.iter_mut() {
                row.retain(|k, _| columns.iter().any(|c| c == k));
            }
        }

        debug!("memory select {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    async fn execute(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>, DatabaseError> {
        let mut guard = self.state.write().await;
        let mut working = guard.clone();
        let mut results = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            results.push(working.apply(op)?);
        }
        *guard = working;
        Ok(results)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
