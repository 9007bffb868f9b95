//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use chrono::NaiveDate;
use thiserror::Error;

use super::TransferStatus;

/// Domain-specific errors
///
/// These errors represent invalid input and inventory rule violations.
/// They are independent of the storage and CLI layers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Period start falls after its end
    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    /// Identifier is zero, negative or out of range
    #[error("Invalid {kind} identifier: {value}")]
    InvalidIdentifier { kind: &'static str, value: i64 },

    /// Quantity is zero, negative or exceeds the limit
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Unit price is negative, too precise or too large
    #[error("Invalid unit price: {0}")]
    InvalidPrice(String),

    /// Transfer between a base and itself
    #[error("Source and destination bases cannot be the same")]
    SameBaseTransfer,

    /// Not enough stock at the source base (strict availability only)
    #[error("Insufficient stock: required {required}, available {available}")]
    InsufficientStock { required: i64, available: i64 },

    /// Unknown transfer or assignment status
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Completed and cancelled transfers keep their status
    #[error("Transfer {transfer_id} is already {status}")]
    TransferFinalized {
        transfer_id: i32,
        status: TransferStatus,
    },

    /// Assignment already carries a return date
    #[error("Assignment {0} has already been returned")]
    AssignmentAlreadyReturned(i32),

    /// Return recorded before the assignment itself
    #[error("Return date {returned} is before assignment date {assigned}")]
    InvalidReturnDate {
        assigned: NaiveDate,
        returned: NaiveDate,
    },
}

impl DomainError {
    /// Create an insufficient stock error
    pub fn insufficient_stock(required: i64, available: i64) -> Self {
        Self::InsufficientStock {
            required,
            available,
        }
    }

    /// Check if this error is caused by malformed input
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPeriod { .. }
                | Self::InvalidIdentifier { .. }
                | Self::InvalidQuantity(_)
                | Self::InvalidPrice(_)
                | Self::SameBaseTransfer
                | Self::InvalidStatus(_)
                | Self::InvalidReturnDate { .. }
        )
    }

    /// Check if this error depends on current store contents (retry after a change may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStock { .. }
                | Self::TransferFinalized { .. }
                | Self::AssignmentAlreadyReturned(_)
        )
    }
}
