//! Command Handlers module
//!
//! Handlers validate commands and append movement records to the store.

mod assignment_handler;
mod commands;
mod purchase_handler;
mod transfer_handler;


pub use assignment_handler::AssignmentHandler;
pub use commands::*;
pub use purchase_handler::PurchaseHandler;
pub use transfer_handler::TransferHandler;

use crate::domain::{DomainError, Quantity, UnitPrice};

fn parse_quantity(value: i64) -> Result<Quantity, DomainError> {
    Quantity::new(value).map_err(|e| DomainError::InvalidQuantity(e.to_string()))
}

fn parse_unit_price(value: &str) -> Result<UnitPrice, DomainError> {
    value
        .parse::<UnitPrice>()
        .map_err(|e| DomainError::InvalidPrice(e.to_string()))
}
