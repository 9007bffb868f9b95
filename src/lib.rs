//! Military asset inventory library
//!
//! Re-exports modules for integration testing and the command-line tools.

pub mod balance;
pub mod domain;
pub mod handlers;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use balance::{BalanceAggregator, BalanceQuery, BalanceSnapshot};
pub use config::{Config, LogFormat};
pub use domain::{BalancePolicy, BaseId, DomainError, EquipmentTypeId, OperationContext, Period};
pub use error::{AppError, AppResult, ErrorResponse};
pub use store::{MemoryInventoryStore, PgInventoryStore, StoreError};
