//! Transaction store module
//!
//! Seams between balance computation and persistence. `TransactionStore`
//! sums, appends and lists movement records; `EquipmentCatalog` enumerates
//! the bases and equipment types balances are reported for.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{
    Assignment, AssignmentEntry, AssignmentRecord, Base, BaseId, DomainError, EquipmentType,
    EquipmentTypeId, PurchaseEntry, PurchaseRecord, Transfer, TransferEntry, TransferRecord,
    TransferScope, TransferStatus,
};
use crate::error::{AppError, AppResult};

pub use error::StoreError;
pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

/// Backing collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Purchases,
    Transfers,
    Assignments,
    Bases,
    EquipmentTypes,
}

impl Source {
    pub fn table_name(&self) -> &'static str {
        match self {
            Source::Purchases => "purchases",
            Source::Transfers => "transfers",
            Source::Assignments => "assignments",
            Source::Bases => "bases",
            Source::EquipmentTypes => "equipment_types",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Date filter applied to movement sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Strictly before the date
    Before(NaiveDate),
    /// Between both dates, inclusive
    Between(NaiveDate, NaiveDate),
    /// On or before the date
    Through(NaiveDate),
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            DateWindow::Before(end) => date < end,
            DateWindow::Between(start, end) => start <= date && date <= end,
            DateWindow::Through(end) => date <= end,
        }
    }

    /// Half-open bounds `[lower, upper)`; `None` means unbounded.
    pub fn bounds(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match *self {
            DateWindow::Before(end) => (None, Some(end)),
            DateWindow::Between(start, end) => (Some(start), end.succ_opt()),
            DateWindow::Through(end) => (None, end.succ_opt()),
        }
    }
}

/// Optional base and type restriction for history listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// For transfers, matches either end
    pub base_id: Option<BaseId>,
    pub type_id: Option<EquipmentTypeId>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base_id: BaseId) -> Self {
        self.base_id = Some(base_id);
        self
    }

    pub fn with_type(mut self, type_id: EquipmentTypeId) -> Self {
        self.type_id = Some(type_id);
        self
    }

    /// Validate raw filter values, failing before any store read
    pub fn parse(base_id: Option<i64>, type_id: Option<i64>) -> AppResult<Self> {
        let invalid = |e: DomainError| AppError::InvalidRequest(e.to_string());

        let mut filter = Self::new();
        if let Some(id) = base_id {
            filter = filter.with_base(BaseId::new(id).map_err(invalid)?);
        }
        if let Some(id) = type_id {
            filter = filter.with_type(EquipmentTypeId::new(id).map_err(invalid)?);
        }
        Ok(filter)
    }

    pub fn matches(&self, base_id: BaseId, type_id: EquipmentTypeId) -> bool {
        self.base_id.map_or(true, |b| b == base_id) && self.type_id.map_or(true, |t| t == type_id)
    }

    pub fn matches_transfer(&self, transfer: &TransferRecord) -> bool {
        self.matches(transfer.source_base_id, transfer.type_id)
            || self.matches(transfer.destination_base_id, transfer.type_id)
    }
}

/// Outcome of recording a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedPurchase {
    pub purchase_id: i32,
    /// Placeholder base registered for an unknown id
    pub created_base: bool,
    /// Placeholder equipment type registered for an unknown id
    pub created_type: bool,
}

/// Exclusive hold on one base and equipment type for an availability check.
///
/// Dropping the lock without inserting releases it and writes nothing.
#[async_trait]
pub trait StockLock: Send {
    /// Append the transfer and release the lock
    async fn insert_transfer(self: Box<Self>, transfer: &TransferRecord)
        -> Result<i32, StoreError>;
}

/// Read and append access to purchases, transfers and assignments.
///
/// Every `sum_*` returns the total quantity of matching records, zero when
/// nothing matches. When the backing table of a source does not exist yet,
/// implementations return `StoreError::SourceUnavailable`.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn sum_purchases(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError>;

    async fn sum_transfers_in(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError>;

    async fn sum_transfers_out(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError>;

    /// Sum by assignment date
    async fn sum_assignments(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError>;

    /// Sum by return date, over returned assignments only
    async fn sum_assignment_returns(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError>;

    /// Distinct dates strictly after `after` on which any record moves stock
    /// of this base and type, ascending. Missing sources contribute no dates.
    async fn movement_dates(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        after: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError>;

    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> Result<i32, StoreError>;

    /// Register placeholder catalog entries for unknown ids and insert the
    /// purchase, all or nothing
    async fn record_purchase(&self, purchase: &PurchaseRecord)
        -> Result<RecordedPurchase, StoreError>;

    async fn insert_transfer(&self, transfer: &TransferRecord) -> Result<i32, StoreError>;

    /// Serialize checked transfers out of `base` for one equipment type.
    /// Held until the returned lock inserts or is dropped.
    async fn lock_stock(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
    ) -> Result<Box<dyn StockLock>, StoreError>;

    async fn get_transfer(&self, transfer_id: i32) -> Result<Option<Transfer>, StoreError>;

    async fn set_transfer_status(
        &self,
        transfer_id: i32,
        status: TransferStatus,
    ) -> Result<(), StoreError>;

    async fn insert_assignment(&self, assignment: &AssignmentRecord) -> Result<i32, StoreError>;

    async fn get_assignment(&self, assignment_id: i32) -> Result<Option<Assignment>, StoreError>;

    /// Set the return date and `returned` status on an assignment
    async fn mark_assignment_returned(
        &self,
        assignment_id: i32,
        return_date: NaiveDate,
    ) -> Result<(), StoreError>;

    // History listings, newest first

    async fn list_purchases(&self, filter: ListFilter) -> Result<Vec<PurchaseEntry>, StoreError>;

    async fn list_transfers(&self, filter: ListFilter) -> Result<Vec<TransferEntry>, StoreError>;

    async fn list_assignments(&self, filter: ListFilter)
        -> Result<Vec<AssignmentEntry>, StoreError>;
}

/// Enumeration of bases and equipment types
#[async_trait]
pub trait EquipmentCatalog: Send + Sync {
    /// All equipment types, ordered by type id
    async fn equipment_types(&self) -> Result<Vec<EquipmentType>, StoreError>;

    /// All bases, ordered by base id
    async fn bases(&self) -> Result<Vec<Base>, StoreError>;
}
