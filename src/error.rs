//! Error handling module
//!
//! Centralized error types and their machine-readable rendering.

use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Storage errors
    #[error(transparent)]
    Store(#[from] StoreError),

    // Server errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable code identifying the error category
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidPeriod { .. } => "invalid_period",
                DomainError::InvalidIdentifier { .. } => "invalid_identifier",
                DomainError::InvalidQuantity(_) => "invalid_quantity",
                DomainError::InvalidPrice(_) => "invalid_price",
                DomainError::SameBaseTransfer => "same_base_transfer",
                DomainError::InsufficientStock { .. } => "insufficient_stock",
                DomainError::InvalidStatus(_) => "invalid_status",
                DomainError::TransferFinalized { .. } => "transfer_finalized",
                DomainError::AssignmentAlreadyReturned(_) => "already_returned",
                DomainError::InvalidReturnDate { .. } => "invalid_return_date",
            },
            AppError::Store(StoreError::SourceUnavailable(_)) => "source_unavailable",
            AppError::Store(StoreError::NotFound { .. }) => "not_found",
            AppError::Store(_) | AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// True when the caller supplied bad input rather than the system failing
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::InvalidRequest(_) | AppError::NotFound { .. } | AppError::Domain(_) => true,
            AppError::Store(StoreError::NotFound { .. }) => true,
            _ => false,
        }
    }

    /// True when the request was valid but current inventory state refuses it
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Domain(domain_err) if domain_err.is_conflict_error())
    }

    /// Process exit status for the command-line front end
    pub fn exit_code(&self) -> i32 {
        if self.is_conflict() {
            3
        } else if self.is_client_error() {
            2
        } else {
            1
        }
    }
}

/// Error body printed for a failed command
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let details = match err {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::NotFound { id, .. } => Some(id.clone()),
            AppError::Domain(domain_err) => Some(domain_err.to_string()),
            // Server-side detail goes to the log, not the caller
            _ => None,
        };

        Self {
            error: err.to_string(),
            error_code: err.error_code().to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Source;

    #[test]
    fn test_domain_errors_are_client_errors() {
        let err: AppError = DomainError::SameBaseTransfer.into();

        assert!(err.is_client_error());
        assert!(!err.is_conflict());
        assert_eq!(err.error_code(), "same_base_transfer");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_conflicts_have_own_exit_code() {
        let err: AppError = DomainError::insufficient_stock(10, 4).into();

        assert!(err.is_client_error());
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), "insufficient_stock");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_store_failures_are_server_errors() {
        let err: AppError = StoreError::SourceUnavailable(Source::Purchases).into();

        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "source_unavailable");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_store_not_found_is_client_error() {
        let err: AppError = StoreError::NotFound {
            kind: "Assignment",
            id: 9,
        }
        .into();

        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn test_error_response_hides_server_details() {
        let err = AppError::Internal("connection reset".to_string());
        let body = ErrorResponse::from(&err);

        assert_eq!(body.error_code, "internal_error");
        assert!(body.details.is_none());

        let err = AppError::InvalidRequest("missing base".to_string());
        let body = ErrorResponse::from(&err);
        assert_eq!(body.details.as_deref(), Some("missing base"));
    }
}
