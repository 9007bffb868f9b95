//! Command definitions
//!
//! Commands carry raw caller input. Handlers validate it before anything is
//! written.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AssignmentStatus, TransferStatus};

// =========================================================================
// RecordPurchaseCommand
// =========================================================================

/// Command to record equipment bought for a base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPurchaseCommand {
    pub base_id: i64,
    pub type_id: i64,
    pub quantity: i64,
    /// Unit price as a decimal string
    pub unit_price: String,
    pub purchase_date: NaiveDate,
    pub vendor_name: Option<String>,
    pub purchase_order_number: Option<String>,
}

impl RecordPurchaseCommand {
    pub fn new(
        base_id: i64,
        type_id: i64,
        quantity: i64,
        unit_price: String,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            base_id,
            type_id,
            quantity,
            unit_price,
            purchase_date,
            vendor_name: None,
            purchase_order_number: None,
        }
    }

    pub fn with_vendor(mut self, vendor_name: String) -> Self {
        self.vendor_name = Some(vendor_name);
        self
    }

    pub fn with_order_number(mut self, purchase_order_number: String) -> Self {
        self.purchase_order_number = Some(purchase_order_number);
        self
    }
}

// =========================================================================
// RecordTransferCommand
// =========================================================================

/// Command to move equipment between two bases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTransferCommand {
    pub source_base_id: i64,
    pub destination_base_id: i64,
    pub type_id: i64,
    pub quantity: i64,
    pub transfer_date: NaiveDate,
    pub transfer_order_number: Option<String>,
    pub status: TransferStatus,
}

impl RecordTransferCommand {
    pub fn new(
        source_base_id: i64,
        destination_base_id: i64,
        type_id: i64,
        quantity: i64,
        transfer_date: NaiveDate,
    ) -> Self {
        Self {
            source_base_id,
            destination_base_id,
            type_id,
            quantity,
            transfer_date,
            transfer_order_number: None,
            status: TransferStatus::Pending,
        }
    }

    pub fn with_order_number(mut self, transfer_order_number: String) -> Self {
        self.transfer_order_number = Some(transfer_order_number);
        self
    }

    pub fn with_status(mut self, status: TransferStatus) -> Self {
        self.status = status;
        self
    }
}

// =========================================================================
// UpdateTransferStatusCommand
// =========================================================================

/// Command to move a transfer along its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTransferStatusCommand {
    pub transfer_id: i32,
    pub status: TransferStatus,
}

impl UpdateTransferStatusCommand {
    pub fn new(transfer_id: i32, status: TransferStatus) -> Self {
        Self {
            transfer_id,
            status,
        }
    }
}

// =========================================================================
// RecordAssignmentCommand
// =========================================================================

/// Command to hand equipment to personnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAssignmentCommand {
    pub base_id: i64,
    pub type_id: i64,
    pub quantity: i64,
    /// Personnel ID of the recipient
    pub assigned_to: i64,
    pub assignment_date: NaiveDate,
    pub notes: Option<String>,
}

impl RecordAssignmentCommand {
    pub fn new(
        base_id: i64,
        type_id: i64,
        quantity: i64,
        assigned_to: i64,
        assignment_date: NaiveDate,
    ) -> Self {
        Self {
            base_id,
            type_id,
            quantity,
            assigned_to,
            assignment_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }
}

// =========================================================================
// ReturnAssignmentCommand
// =========================================================================

/// Command to mark an assignment as given back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnAssignmentCommand {
    pub assignment_id: i32,
    pub return_date: NaiveDate,
}

impl ReturnAssignmentCommand {
    pub fn new(assignment_id: i32, return_date: NaiveDate) -> Self {
        Self {
            assignment_id,
            return_date,
        }
    }
}

/// Result of a recorded purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub purchase_id: i32,
    pub base_id: i32,
    pub type_id: i32,
    pub quantity: i32,
    pub total_amount: Decimal,
    /// Placeholder base registered for an unknown id
    pub created_base: bool,
    /// Placeholder equipment type registered for an unknown id
    pub created_type: bool,
}

/// Result of a recorded transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: i32,
    pub source_base_id: i32,
    pub destination_base_id: i32,
    pub type_id: i32,
    pub quantity: i32,
    pub status: TransferStatus,
}

/// Result of a transfer status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStatusResult {
    pub transfer_id: i32,
    pub previous_status: TransferStatus,
    pub status: TransferStatus,
}

/// Result of a recorded assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub assignment_id: i32,
    pub base_id: i32,
    pub type_id: i32,
    pub quantity: i32,
    pub status: AssignmentStatus,
}

/// Result of a returned assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnResult {
    pub assignment_id: i32,
    pub return_date: NaiveDate,
    pub status: AssignmentStatus,
}
