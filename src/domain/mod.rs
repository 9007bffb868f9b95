//! Domain module
//!
//! Core domain types and validation rules.

pub mod context;
pub mod error;
pub mod period;
pub mod policy;
pub mod quantity;
pub mod records;

pub use context::OperationContext;
pub use error::DomainError;
pub use period::{BaseId, EquipmentTypeId, Period};
pub use policy::{AvailabilityMode, BalancePolicy, PolicyParseError, ReturnPolicy, TransferScope};
pub use quantity::{Quantity, QuantityError, UnitPrice};
pub use records::{
    Assignment, AssignmentEntry, AssignmentRecord, AssignmentStatus, Base, EquipmentType,
    PurchaseEntry, PurchaseRecord, Transfer, TransferEntry, TransferRecord, TransferStatus,
};
