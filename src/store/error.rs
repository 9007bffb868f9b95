//! Store Errors
//!
//! Error types for transaction store operations.

use super::Source;

/// Postgres SQLSTATE for "relation does not exist"
const UNDEFINED_TABLE: &str = "42P01";

/// Errors that can occur in a transaction store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing table for a source has not been created
    #[error("Source unavailable: {0} table does not exist")]
    SourceUnavailable(Source),

    /// Record not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store-internal failure (poisoned lock, corrupt row)
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Classify a sqlx error raised while reading or writing `source`
    pub fn from_sqlx(err: sqlx::Error, source: Source) -> Self {
        let missing_table = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code == UNDEFINED_TABLE)
            .unwrap_or(false);

        if missing_table {
            StoreError::SourceUnavailable(source)
        } else {
            StoreError::Database(err)
        }
    }

    /// Check if this error only means a source has no backing table yet
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, StoreError::SourceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_not_missing_source() {
        let err = StoreError::from_sqlx(sqlx::Error::RowNotFound, Source::Purchases);
        assert!(!err.is_source_unavailable());
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_source_unavailable_display() {
        let err = StoreError::SourceUnavailable(Source::Transfers);
        assert!(err.is_source_unavailable());
        assert_eq!(
            err.to_string(),
            "Source unavailable: transfers table does not exist"
        );
    }
}
