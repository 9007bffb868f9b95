//! Inventory records
//!
//! Purchases, transfers and assignments are append-only facts. Balances are
//! never stored; they are derived from these records on demand.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BaseId, DomainError, EquipmentTypeId, Quantity, UnitPrice};

/// A base holding asset stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub base_id: BaseId,
    pub base_name: String,
    pub location: Option<String>,
    pub commander: Option<String>,
}

impl Base {
    /// Stand-in row created when a record references a base nobody registered
    pub fn placeholder(base_id: BaseId) -> Self {
        Self {
            base_id,
            base_name: format!("Base {}", base_id),
            location: Some("Unknown Location".to_string()),
            commander: None,
        }
    }
}

/// A category of asset tracked independently for balance purposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub type_id: EquipmentTypeId,
    pub type_name: String,
    pub category: Option<String>,
}

impl EquipmentType {
    /// Stand-in row created when a record references an unregistered type
    pub fn placeholder(type_id: EquipmentTypeId) -> Self {
        Self {
            type_id,
            type_name: format!("Equipment Type {}", type_id),
            category: Some("Unknown".to_string()),
        }
    }
}

/// Lifecycle of a transfer between bases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled transfers cannot change status again
    pub fn is_final(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "in_transit" => Ok(TransferStatus::InTransit),
            "completed" => Ok(TransferStatus::Completed),
            "cancelled" => Ok(TransferStatus::Cancelled),
            other => Err(DomainError::InvalidStatus(format!("transfer status '{}'", other))),
        }
    }
}

/// Lifecycle of an assignment to personnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Returned,
    Expended,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Returned => "returned",
            AssignmentStatus::Expended => "expended",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssignmentStatus::Active),
            "returned" => Ok(AssignmentStatus::Returned),
            "expended" => Ok(AssignmentStatus::Expended),
            other => Err(DomainError::InvalidStatus(format!(
                "assignment status '{}'",
                other
            ))),
        }
    }
}

/// Procurement of equipment at a base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub base_id: BaseId,
    pub type_id: EquipmentTypeId,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
    pub purchase_date: NaiveDate,
    pub vendor_name: Option<String>,
    pub purchase_order_number: Option<String>,
    pub created_by: Option<i32>,
}

impl PurchaseRecord {
    pub fn total_amount(&self) -> Decimal {
        self.unit_price.total_for(self.quantity)
    }
}

/// Movement of equipment from one base to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub source_base_id: BaseId,
    pub destination_base_id: BaseId,
    pub type_id: EquipmentTypeId,
    pub quantity: Quantity,
    pub transfer_date: NaiveDate,
    pub transfer_order_number: Option<String>,
    pub status: TransferStatus,
}

/// A stored transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_id: i32,
    #[serde(flatten)]
    pub details: TransferRecord,
}

/// Equipment handed out to personnel at a base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub base_id: BaseId,
    pub type_id: EquipmentTypeId,
    pub quantity: Quantity,
    pub assigned_to: i32,
    pub assignment_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
}

impl AssignmentRecord {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some() || self.status == AssignmentStatus::Returned
    }
}

/// A stored assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: i32,
    #[serde(flatten)]
    pub details: AssignmentRecord,
}

// =========================================================================
// History entries
// =========================================================================

/// A purchase as listed in history, with catalog names resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub purchase_id: i32,
    #[serde(flatten)]
    pub details: PurchaseRecord,
    pub total_amount: Decimal,
    pub base_name: Option<String>,
    pub type_name: Option<String>,
}

/// A transfer as listed in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub source_base_name: Option<String>,
    pub destination_base_name: Option<String>,
    pub type_name: Option<String>,
}

/// An assignment as listed in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub base_name: Option<String>,
    pub type_name: Option<String>,
}
