use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::store::{Row, Table};
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Renders store operations into Postgres statements. Every statement
/// projects whole rows through `row_to_json` so results come back as JSON
/// maps regardless of column types.
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn select(table: Table, filter_data: FilterData, max_limit: Option<i32>) -> Result<SqlResult, DatabaseError> {
        let mut filter = Filter::new(table.name())?.with_max_limit(max_limit);
        filter.assign(filter_data)?;
        let inner = filter.to_sql()?;
        Ok(SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        })
    }

    /// Multi-row insert. Columns are the union of the row keys; a row that
    /// lacks one of them gets the column default.
    pub fn insert(table: Table, rows: &[Row]) -> Result<SqlResult, DatabaseError> {
        if rows.is_empty() {
            return Err(DatabaseError::QueryError(format!("insert into {} without rows", table)));
        }

        let columns: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
        if columns.is_empty() {
            return Ok(SqlResult {
                query: format!(
                    "INSERT INTO {} AS t DEFAULT VALUES RETURNING row_to_json(t) AS row",
                    DatabaseManager::quote_identifier(table.name())
                ),
                params: vec![],
            });
        }
        for column in &columns {
            crate::filter::filter_where::validate_identifier(column)?;
        }

        let mut params = Vec::new();
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                values.push(match row.get(column.as_str()) {
                    None => "DEFAULT".to_string(),
                    Some(Value::Null) => "NULL".to_string(),
                    Some(value) => {
                        params.push(value.clone());
                        format!("${}", params.len())
                    }
                });
            }
            tuples.push(format!("({})", values.join(", ")));
        }

        let column_list = columns
            .iter()
            .map(|c| DatabaseManager::quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(SqlResult {
            query: format!(
                "INSERT INTO {} AS t ({}) VALUES {} RETURNING row_to_json(t) AS row",
                DatabaseManager::quote_identifier(table.name()),
                column_list,
                tuples.join(", ")
            ),
            params,
        })
    }

    pub fn update(table: Table, where_data: &Value, changes: &Row) -> Result<SqlResult, DatabaseError> {
        let mut params = Vec::new();
        let mut assignments = Vec::new();
        for (column, value) in changes {
            crate::filter::filter_where::validate_identifier(column)?;
            let quoted = DatabaseManager::quote_identifier(column);
            if value.is_null() {
                assignments.push(format!("{} = NULL", quoted));
            } else {
                params.push(value.clone());
                assignments.push(format!("{} = ${}", quoted, params.len()));
            }
        }
        if table.has_updated_at() && !changes.contains_key("updated_at") {
            assignments.push("\"updated_at\" = now()".to_string());
        }
        if assignments.is_empty() {
            return Err(DatabaseError::QueryError(format!("update of {} without changes", table)));
        }

        let where_sql = Self::where_sql(table, where_data, params.len())?;
        params.extend(where_sql.params);

        Ok(SqlResult {
            query: format!(
                "UPDATE {} AS t SET {} WHERE {} RETURNING row_to_json(t) AS row",
                DatabaseManager::quote_identifier(table.name()),
                assignments.join(", "),
                where_sql.query
            ),
            params,
        })
    }

    pub fn delete(table: Table, where_data: &Value) -> Result<SqlResult, DatabaseError> {
        let where_sql = Self::where_sql(table, where_data, 0)?;
        Ok(SqlResult {
            query: format!(
                "DELETE FROM {} AS t WHERE {} RETURNING row_to_json(t) AS row",
                DatabaseManager::quote_identifier(table.name()),
                where_sql.query
            ),
            params: where_sql.params,
        })
    }

    fn where_sql(table: Table, where_data: &Value, starting_param_index: usize) -> Result<SqlResult, DatabaseError> {
        let mut filter = Filter::new(table.name())?;
        filter.where_clause(where_data.clone())?;
        Ok(filter.to_where_sql(starting_param_index)?)
    }
}

/// Bind a JSON parameter with the closest Postgres type. Strings that look
/// like uuids or RFC 3339 timestamps bind as such so they compare against
/// typed columns without casts.
pub fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                q.bind(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                q.bind(ts.with_timezone(&Utc))
            } else {
                q.bind(s.clone())
            }
        }
        Value::Array(_) | Value::Object(_) => q.bind(sqlx::types::Json(v.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::row;
    use serde_json::json;

    #[test]
    fn select_wraps_rows_in_json() {
        let sql = QueryBuilder::select(
            Table::Projects,
            FilterData::where_(json!({ "status": "PUBLISHED" })).order_by("created_at desc"),
            None,
        )
        .unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"projects\" WHERE \"status\" = $1 ORDER BY \"created_at\" DESC) t"
        );
        assert_eq!(sql.params, vec![json!("PUBLISHED")]);
    }

    #[test]
    fn insert_fills_missing_columns_with_default() {
        let rows = vec![
            row(json!({ "project_id": "p1", "trail_id": "t1" })),
            row(json!({ "project_id": "p1" })),
        ];
        let sql = QueryBuilder::insert(Table::ProjectTrails, &rows).unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"project_trails\" AS t (\"project_id\", \"trail_id\") VALUES ($1, $2), ($3, DEFAULT) RETURNING row_to_json(t) AS row"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn insert_writes_null_literally() {
        let sql = QueryBuilder::insert(Table::Students, &[row(json!({ "about": null, "name": "Ana" }))]).unwrap();
        assert!(sql.query.contains("VALUES (NULL, $1)"));
        assert_eq!(sql.params, vec![json!("Ana")]);
    }

    #[test]
    fn update_numbers_where_params_after_set() {
        let sql = QueryBuilder::update(
            Table::Projects,
            &json!({ "id": "p1", "status": "DRAFT" }),
            &row(json!({ "title": "New", "banner_url": null })),
        )
        .unwrap();
        assert_eq!(
            sql.query,
            "UPDATE \"projects\" AS t SET \"banner_url\" = NULL, \"title\" = $1, \"updated_at\" = now() WHERE \"id\" = $2 AND \"status\" = $3 RETURNING row_to_json(t) AS row"
        );
        assert_eq!(sql.params, vec![json!("New"), json!("p1"), json!("DRAFT")]);
    }

    #[test]
    fn update_without_changes_is_rejected() {
        assert!(QueryBuilder::update(Table::Reports, &json!({ "id": "r" }), &Row::new()).is_err());
    }

    #[test]
    fn delete_returns_removed_rows() {
        let sql = QueryBuilder::delete(Table::ProjectProfessors, &json!({ "project_id": "p1" })).unwrap();
        assert_eq!(
            sql.query,
            "DELETE FROM \"project_professors\" AS t WHERE \"project_id\" = $1 RETURNING row_to_json(t) AS row"
        );
    }

    #[test]
    fn rejects_hostile_column_names() {
        let bad = row(json!({ "name\" = 'x'; --": "x" }));
        assert!(QueryBuilder::insert(Table::Students, &[bad.clone()]).is_err());
        assert!(QueryBuilder::update(Table::Students, &json!({}), &bad).is_err());
    }
}
