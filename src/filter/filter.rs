use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{validate_identifier, FilterWhere};
use super::types::{FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    max_limit: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: None,
        })
    }

    /// Cap explicit limits at `max_limit`. Unlimited reads stay unlimited.
    pub fn with_max_limit(mut self, max_limit: Option<i32>) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if data.limit.is_some() || data.offset.is_some() {
            self.limit(data.limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        Self::validate_select_columns(&columns)?;
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i32>, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit { if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); } }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn where_data(&self) -> Option<&Value> {
        self.where_data.as_ref()
    }

    pub fn order_data(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    pub fn select_columns(&self) -> &[String] {
        &self.select_columns
    }

    pub fn offset_value(&self) -> Option<i32> {
        self.offset
    }

    /// Requested limit after applying the configured cap.
    pub fn effective_limit(&self) -> Option<i32> {
        match (self.limit, self.max_limit) {
            (Some(l), Some(max)) if l > max => {
                tracing::warn!("Limit {} exceeds max {}, capping to max", l, max);
                Some(max)
            }
            (Some(l), _) => Some(l),
            (None, _) => None,
        }
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql(0)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let where_data = self.where_data.clone().unwrap_or(Value::Null);
        let (query, params) = FilterWhere::generate(&where_data, starting_param_index)?;
        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() { return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string())); }
        validate_identifier(name).map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
    }

    fn validate_select_columns(columns: &[String]) -> Result<(), FilterError> {
        for column in columns {
            if column == "*" { continue; }
            validate_identifier(column)?;
        }
        Ok(())
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.effective_limit(), self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_full_select() {
        let mut filter = Filter::new("projects").unwrap();
        filter
            .assign(FilterData {
                select: Some(vec!["id".to_string(), "title".to_string()]),
                where_clause: Some(json!({ "status": "DRAFT" })),
                order: Some(json!("created_at desc")),
                limit: Some(10),
                offset: Some(20),
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"title\" FROM \"projects\" WHERE \"status\" = $1 ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("DRAFT")]);
    }

    #[test]
    fn caps_limit_at_max() {
        let mut filter = Filter::new("trails").unwrap().with_max_limit(Some(100));
        filter.limit(Some(5000), None).unwrap();
        assert_eq!(filter.effective_limit(), Some(100));
        assert!(filter.to_sql().unwrap().query.ends_with("LIMIT 100"));
    }

    #[test]
    fn max_limit_leaves_unlimited_reads_alone() {
        let filter = Filter::new("project_trails").unwrap().with_max_limit(Some(100));
        assert_eq!(filter.effective_limit(), None);
        assert!(!filter.to_sql().unwrap().query.contains("LIMIT"));
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("students; drop table students").is_err());
        assert!(Filter::new("").is_err());
    }
}
