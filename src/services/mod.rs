pub mod comments;
pub mod drafts;
pub mod projects;
pub mod students;
pub mod tags;
pub mod views;

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{PasswordError, SessionError};
use crate::database::{DatabaseError, Row};
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// A write was rejected by a unique or foreign key constraint
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(DatabaseError),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(what),
            DatabaseError::Constraint(detail) => ServiceError::Conflict(detail),
            other => ServiceError::Store(other),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingExtension(name) => {
                ServiceError::Validation(format!("File name must have an extension: {}", name))
            }
            other => ServiceError::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Read a uuid column out of a raw row
pub(crate) fn uuid_column(row: &Row, column: &str) -> Result<Uuid, DatabaseError> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| DatabaseError::Decode(format!("column {} is not a uuid", column)))
}

/// Distinct values in first-seen order
pub(crate) fn distinct<T: Copy + Eq + std::hash::Hash>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

/// Query-string pairs with empty values dropped
pub(crate) fn query_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.trim().to_string()))
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

pub(crate) fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_drop_empty_values() {
        let pairs = query_pairs("?semester=3&publishedYear=&subjectId=%20");
        assert_eq!(pairs, vec![("semester".to_string(), "3".to_string())]);
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        assert_eq!(distinct([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn constraint_violations_become_conflicts() {
        let err: ServiceError = DatabaseError::Constraint("students_email_key".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err: ServiceError = DatabaseError::NotFound("project".to_string()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
