use thiserror::Error;

/// Rejections raised while validating `FilterData` or rendering it to SQL.
/// The in-memory store reports the same errors so both backends agree on
/// what a bad filter is.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid where clause: {0}")]
    InvalidWhereClause(String),

    #[error("Unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    /// Operator present but its operand has the wrong shape, e.g. `$in`
    /// without an array or `$between` without two bounds
    #[error("Invalid operand: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}
