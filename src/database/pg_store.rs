use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row as _, Transaction};
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::query_builder::{bind_param, QueryBuilder};
use crate::database::store::{Row, Store, Table, WriteBatch, WriteOp};
use crate::filter::types::SqlResult;
use crate::filter::FilterData;

/// Postgres-backed store. Each write batch runs in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    max_limit: Option<i32>,
}

impl PgStore {
    pub fn new(pool: PgPool, max_limit: Option<i32>) -> Self {
        Self { pool, max_limit }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run(tx: &mut Transaction<'static, Postgres>, sql: SqlResult) -> Result<Vec<Row>, DatabaseError> {
        debug!("{} ({} params)", sql.query, sql.params.len());
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&mut **tx).await?;
        rows.iter().map(decode_json_row).collect()
    }
}

fn decode_json_row(row: &sqlx::postgres::PgRow) -> Result<Row, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Decode(format!("expected object row, got {}", other))),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, table: Table, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let sql = QueryBuilder::select(table, filter, self.max_limit)?;
        debug!("{} ({} params)", sql.query, sql.params.len());
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(decode_json_row).collect()
    }

    async fn execute(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(batch.len());

        for op in batch.into_ops() {
            let rows = match op {
                WriteOp::Insert { table, rows } => {
                    if rows.is_empty() {
                        Vec::new()
                    } else {
                        Self::run(&mut tx, QueryBuilder::insert(table, &rows)?).await?
                    }
                }
                WriteOp::Update { table, filter, changes, must_match } => {
                    let rows = Self::run(&mut tx, QueryBuilder::update(table, &filter, &changes)?).await?;
                    if must_match && rows.is_empty() {
                        // Dropping the transaction rolls back earlier ops
                        return Err(DatabaseError::NotFound(format!("{} matching {}", table, filter)));
                    }
                    rows
                }
                WriteOp::Delete { table, filter } => Self::run(&mut tx, QueryBuilder::delete(table, &filter)?).await?,
            };
            results.push(rows);
        }

        tx.commit().await?;
        Ok(results)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
