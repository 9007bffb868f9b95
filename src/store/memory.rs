//! In-memory transaction store
//!
//! Holds records in process memory behind a mutex. Used by tests, the
//! offline demo and anywhere a database is not wanted. Sources can be
//! switched off to mimic a database whose tables were never created.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{
    Assignment, AssignmentEntry, AssignmentRecord, AssignmentStatus, Base, BaseId, EquipmentType,
    EquipmentTypeId, PurchaseEntry, PurchaseRecord, Transfer, TransferEntry, TransferRecord,
    TransferScope, TransferStatus,
};

use super::{
    DateWindow, EquipmentCatalog, ListFilter, RecordedPurchase, Source, StockLock, StoreError,
    TransactionStore,
};

#[derive(Default)]
struct MemoryState {
    bases: Vec<Base>,
    equipment_types: Vec<EquipmentType>,
    purchases: Vec<(i32, PurchaseRecord)>,
    transfers: Vec<(i32, TransferRecord)>,
    assignments: Vec<Assignment>,
    unavailable: HashSet<Source>,
}

impl MemoryState {
    fn check(&self, source: Source) -> Result<(), StoreError> {
        if self.unavailable.contains(&source) {
            return Err(StoreError::SourceUnavailable(source));
        }
        Ok(())
    }

    fn is_available(&self, source: Source) -> bool {
        !self.unavailable.contains(&source)
    }

    fn base_name(&self, base_id: BaseId) -> Option<String> {
        self.bases
            .iter()
            .find(|b| b.base_id == base_id)
            .map(|b| b.base_name.clone())
    }

    fn type_name(&self, type_id: EquipmentTypeId) -> Option<String> {
        self.equipment_types
            .iter()
            .find(|t| t.type_id == type_id)
            .map(|t| t.type_name.clone())
    }

    fn upsert_base(&mut self, base: Base) {
        self.bases.retain(|b| b.base_id != base.base_id);
        self.bases.push(base);
        self.bases.sort_by_key(|b| b.base_id);
    }

    fn upsert_equipment_type(&mut self, equipment_type: EquipmentType) {
        self.equipment_types
            .retain(|t| t.type_id != equipment_type.type_id);
        self.equipment_types.push(equipment_type);
        self.equipment_types.sort_by_key(|t| t.type_id);
    }
}

/// Transaction store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryInventoryStore {
    state: Arc<Mutex<MemoryState>>,
    /// Held across a checked transfer, from availability check to insert
    transfer_gate: Arc<AsyncMutex<()>>,
}

/// Checked-transfer lock over the memory store
struct MemoryStockLock {
    store: MemoryInventoryStore,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl StockLock for MemoryStockLock {
    async fn insert_transfer(
        self: Box<Self>,
        transfer: &TransferRecord,
    ) -> Result<i32, StoreError> {
        TransactionStore::insert_transfer(&self.store, transfer).await
    }
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the standard bases and equipment types
    pub fn with_default_catalog() -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.bases = default_bases();
            state.equipment_types = default_equipment_types();
        }
        store
    }

    /// Make a source behave as if its table did not exist
    pub fn drop_source(&self, source: Source) -> Result<(), StoreError> {
        self.lock()?.unavailable.insert(source);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }
}

/// Bases every fresh installation starts with
pub fn default_bases() -> Vec<Base> {
    [
        (1, "Alpha Base", "Northern Region", "Col. James Anderson"),
        (2, "Beta Base", "Eastern Region", "Col. Sarah Mitchell"),
        (3, "Charlie Base", "Western Region", "Col. Robert Johnson"),
        (4, "Delta Base", "Southern Region", "Col. Emily Williams"),
    ]
    .into_iter()
    .filter_map(|(id, name, location, commander)| {
        Some(Base {
            base_id: BaseId::new(id).ok()?,
            base_name: name.to_string(),
            location: Some(location.to_string()),
            commander: Some(commander.to_string()),
        })
    })
    .collect()
}

/// Equipment types every fresh installation starts with
pub fn default_equipment_types() -> Vec<EquipmentType> {
    [
        (1, "Vehicle", "Transportation"),
        (2, "Weapon", "Armament"),
        (3, "Communication", "Electronics"),
        (4, "Medical", "Support"),
        (5, "Uniform", "Personnel"),
    ]
    .into_iter()
    .filter_map(|(id, name, category)| {
        Some(EquipmentType {
            type_id: EquipmentTypeId::new(id).ok()?,
            type_name: name.to_string(),
            category: Some(category.to_string()),
        })
    })
    .collect()
}

fn next_id(len: usize) -> Result<i32, StoreError> {
    i32::try_from(len + 1).map_err(|_| StoreError::Internal("record id overflow".to_string()))
}

#[async_trait]
impl TransactionStore for MemoryInventoryStore {
    async fn sum_purchases(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        state.check(Source::Purchases)?;

        Ok(state
            .purchases
            .iter()
            .map(|(_, p)| p)
            .filter(|p| p.base_id == base && p.type_id == equipment_type)
            .filter(|p| window.contains(p.purchase_date))
            .map(|p| p.quantity.as_i64())
            .sum())
    }

    async fn sum_transfers_in(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        state.check(Source::Transfers)?;

        Ok(state
            .transfers
            .iter()
            .map(|(_, t)| t)
            .filter(|t| t.destination_base_id == base && t.type_id == equipment_type)
            .filter(|t| window.contains(t.transfer_date) && scope.counts(t.status))
            .map(|t| t.quantity.as_i64())
            .sum())
    }

    async fn sum_transfers_out(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        state.check(Source::Transfers)?;

        Ok(state
            .transfers
            .iter()
            .map(|(_, t)| t)
            .filter(|t| t.source_base_id == base && t.type_id == equipment_type)
            .filter(|t| window.contains(t.transfer_date) && scope.counts(t.status))
            .map(|t| t.quantity.as_i64())
            .sum())
    }

    async fn sum_assignments(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        state.check(Source::Assignments)?;

        Ok(state
            .assignments
            .iter()
            .map(|a| &a.details)
            .filter(|a| a.base_id == base && a.type_id == equipment_type)
            .filter(|a| window.contains(a.assignment_date))
            .map(|a| a.quantity.as_i64())
            .sum())
    }

    async fn sum_assignment_returns(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        state.check(Source::Assignments)?;

        Ok(state
            .assignments
            .iter()
            .map(|a| &a.details)
            .filter(|a| a.base_id == base && a.type_id == equipment_type)
            .filter(|a| a.return_date.is_some_and(|d| window.contains(d)))
            .map(|a| a.quantity.as_i64())
            .sum())
    }

    async fn movement_dates(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        after: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let state = self.lock()?;
        let mut dates = BTreeSet::new();

        if state.is_available(Source::Purchases) {
            dates.extend(
                state
                    .purchases
                    .iter()
                    .filter(|(_, p)| p.base_id == base && p.type_id == equipment_type)
                    .map(|(_, p)| p.purchase_date),
            );
        }
        if state.is_available(Source::Transfers) {
            dates.extend(
                state
                    .transfers
                    .iter()
                    .map(|(_, t)| t)
                    .filter(|t| t.source_base_id == base || t.destination_base_id == base)
                    .filter(|t| t.type_id == equipment_type)
                    .map(|t| t.transfer_date),
            );
        }
        if state.is_available(Source::Assignments) {
            for a in state.assignments.iter().map(|a| &a.details) {
                if a.base_id == base && a.type_id == equipment_type {
                    dates.insert(a.assignment_date);
                    dates.extend(a.return_date);
                }
            }
        }

        Ok(dates.into_iter().filter(|d| *d > after).collect())
    }

    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> Result<i32, StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Purchases)?;

        let id = next_id(state.purchases.len())?;
        state.purchases.push((id, purchase.clone()));
        Ok(id)
    }

    async fn record_purchase(
        &self,
        purchase: &PurchaseRecord,
    ) -> Result<RecordedPurchase, StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Bases)?;
        state.check(Source::EquipmentTypes)?;
        state.check(Source::Purchases)?;

        let purchase_id = next_id(state.purchases.len())?;
        let created_base = state.base_name(purchase.base_id).is_none();
        let created_type = state.type_name(purchase.type_id).is_none();

        if created_base {
            state.upsert_base(Base::placeholder(purchase.base_id));
        }
        if created_type {
            state.upsert_equipment_type(EquipmentType::placeholder(purchase.type_id));
        }
        state.purchases.push((purchase_id, purchase.clone()));

        Ok(RecordedPurchase {
            purchase_id,
            created_base,
            created_type,
        })
    }

    async fn insert_transfer(&self, transfer: &TransferRecord) -> Result<i32, StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Transfers)?;

        let id = next_id(state.transfers.len())?;
        state.transfers.push((id, transfer.clone()));
        Ok(id)
    }

    async fn lock_stock(
        &self,
        _base: BaseId,
        _equipment_type: EquipmentTypeId,
    ) -> Result<Box<dyn StockLock>, StoreError> {
        let gate = Arc::clone(&self.transfer_gate).lock_owned().await;
        Ok(Box::new(MemoryStockLock {
            store: self.clone(),
            _gate: gate,
        }))
    }

    async fn get_transfer(&self, transfer_id: i32) -> Result<Option<Transfer>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Transfers)?;

        Ok(state
            .transfers
            .iter()
            .find(|(id, _)| *id == transfer_id)
            .map(|(id, details)| Transfer {
                transfer_id: *id,
                details: details.clone(),
            }))
    }

    async fn set_transfer_status(
        &self,
        transfer_id: i32,
        status: TransferStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Transfers)?;

        let (_, transfer) = state
            .transfers
            .iter_mut()
            .find(|(id, _)| *id == transfer_id)
            .ok_or(StoreError::NotFound {
                kind: "Transfer",
                id: transfer_id.into(),
            })?;

        transfer.status = status;
        Ok(())
    }

    async fn insert_assignment(&self, assignment: &AssignmentRecord) -> Result<i32, StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Assignments)?;

        let id = next_id(state.assignments.len())?;
        state.assignments.push(Assignment {
            assignment_id: id,
            details: assignment.clone(),
        });
        Ok(id)
    }

    async fn get_assignment(&self, assignment_id: i32) -> Result<Option<Assignment>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Assignments)?;

        Ok(state
            .assignments
            .iter()
            .find(|a| a.assignment_id == assignment_id)
            .cloned())
    }

    async fn mark_assignment_returned(
        &self,
        assignment_id: i32,
        return_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.check(Source::Assignments)?;

        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.assignment_id == assignment_id)
            .ok_or(StoreError::NotFound {
                kind: "Assignment",
                id: assignment_id.into(),
            })?;

        assignment.details.return_date = Some(return_date);
        assignment.details.status = AssignmentStatus::Returned;
        Ok(())
    }

    async fn list_purchases(&self, filter: ListFilter) -> Result<Vec<PurchaseEntry>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Purchases)?;

        let mut entries: Vec<PurchaseEntry> = state
            .purchases
            .iter()
            .filter(|(_, p)| filter.matches(p.base_id, p.type_id))
            .map(|(id, p)| PurchaseEntry {
                purchase_id: *id,
                details: p.clone(),
                total_amount: p.total_amount(),
                base_name: state.base_name(p.base_id),
                type_name: state.type_name(p.type_id),
            })
            .collect();

        entries.sort_by_key(|e| Reverse((e.details.purchase_date, e.purchase_id)));
        Ok(entries)
    }

    async fn list_transfers(&self, filter: ListFilter) -> Result<Vec<TransferEntry>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Transfers)?;

        let mut entries: Vec<TransferEntry> = state
            .transfers
            .iter()
            .filter(|(_, t)| filter.matches_transfer(t))
            .map(|(id, t)| TransferEntry {
                source_base_name: state.base_name(t.source_base_id),
                destination_base_name: state.base_name(t.destination_base_id),
                type_name: state.type_name(t.type_id),
                transfer: Transfer {
                    transfer_id: *id,
                    details: t.clone(),
                },
            })
            .collect();

        entries.sort_by_key(|e| {
            Reverse((e.transfer.details.transfer_date, e.transfer.transfer_id))
        });
        Ok(entries)
    }

    async fn list_assignments(
        &self,
        filter: ListFilter,
    ) -> Result<Vec<AssignmentEntry>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Assignments)?;

        let mut entries: Vec<AssignmentEntry> = state
            .assignments
            .iter()
            .filter(|a| filter.matches(a.details.base_id, a.details.type_id))
            .map(|a| AssignmentEntry {
                base_name: state.base_name(a.details.base_id),
                type_name: state.type_name(a.details.type_id),
                assignment: a.clone(),
            })
            .collect();

        entries.sort_by_key(|e| {
            Reverse((e.assignment.details.assignment_date, e.assignment.assignment_id))
        });
        Ok(entries)
    }
}

#[async_trait]
impl EquipmentCatalog for MemoryInventoryStore {
    async fn equipment_types(&self) -> Result<Vec<EquipmentType>, StoreError> {
        let state = self.lock()?;
        state.check(Source::EquipmentTypes)?;
        Ok(state.equipment_types.clone())
    }

    async fn bases(&self) -> Result<Vec<Base>, StoreError> {
        let state = self.lock()?;
        state.check(Source::Bases)?;
        Ok(state.bases.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quantity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base(id: i64) -> BaseId {
        BaseId::new(id).unwrap()
    }

    fn weapon() -> EquipmentTypeId {
        EquipmentTypeId::new(2).unwrap()
    }

    fn transfer(status: TransferStatus, quantity: i64) -> TransferRecord {
        TransferRecord {
            source_base_id: base(1),
            destination_base_id: base(2),
            type_id: weapon(),
            quantity: Quantity::new(quantity).unwrap(),
            transfer_date: date(2025, 5, 10),
            transfer_order_number: None,
            status,
        }
    }

    #[tokio::test]
    async fn test_default_catalog_is_ordered() {
        let store = MemoryInventoryStore::with_default_catalog();

        let types = store.equipment_types().await.unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Vehicle", "Weapon", "Communication", "Medical", "Uniform"]
        );
        assert_eq!(store.bases().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_transfer_sums_respect_scope() {
        let store = MemoryInventoryStore::new();
        store
            .insert_transfer(&transfer(TransferStatus::Pending, 10))
            .await
            .unwrap();
        store
            .insert_transfer(&transfer(TransferStatus::Completed, 4))
            .await
            .unwrap();

        let window = DateWindow::Through(date(2025, 12, 31));
        let all = store
            .sum_transfers_out(base(1), weapon(), window, TransferScope::All)
            .await
            .unwrap();
        let settled = store
            .sum_transfers_in(base(2), weapon(), window, TransferScope::Settled)
            .await
            .unwrap();

        assert_eq!(all, 14);
        assert_eq!(settled, 4);
    }

    #[tokio::test]
    async fn test_dropped_source_reports_unavailable() {
        let store = MemoryInventoryStore::new();
        store.drop_source(Source::Assignments).unwrap();

        let result = store
            .sum_assignments(base(1), weapon(), DateWindow::Through(date(2025, 1, 1)))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::SourceUnavailable(Source::Assignments))
        ));
    }

    fn purchase(base_id: i64, type_id: i64, day: NaiveDate) -> PurchaseRecord {
        PurchaseRecord {
            base_id: base(base_id),
            type_id: EquipmentTypeId::new(type_id).unwrap(),
            quantity: Quantity::new(5).unwrap(),
            unit_price: "10.00".parse().unwrap(),
            purchase_date: day,
            vendor_name: None,
            purchase_order_number: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_record_purchase_creates_placeholders_once() {
        let store = MemoryInventoryStore::new();

        let first = store
            .record_purchase(&purchase(7, 3, date(2025, 5, 1)))
            .await
            .unwrap();
        assert!(first.created_base);
        assert!(first.created_type);

        let second = store
            .record_purchase(&purchase(7, 3, date(2025, 5, 2)))
            .await
            .unwrap();
        assert!(!second.created_base);
        assert!(!second.created_type);
        assert_eq!(second.purchase_id, 2);

        let bases = store.bases().await.unwrap();
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].base_name, "Base 7");
    }

    #[tokio::test]
    async fn test_failed_purchase_leaves_catalog_untouched() {
        let store = MemoryInventoryStore::with_default_catalog();
        store.drop_source(Source::Purchases).unwrap();

        let result = store.record_purchase(&purchase(9, 9, date(2025, 5, 1))).await;
        assert!(matches!(
            result,
            Err(StoreError::SourceUnavailable(Source::Purchases))
        ));

        assert_eq!(store.bases().await.unwrap().len(), 4);
        assert_eq!(store.equipment_types().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_record_purchase_respects_dropped_catalog() {
        let store = MemoryInventoryStore::with_default_catalog();
        store.drop_source(Source::Bases).unwrap();

        let result = store.record_purchase(&purchase(9, 2, date(2025, 5, 1))).await;
        assert!(matches!(
            result,
            Err(StoreError::SourceUnavailable(Source::Bases))
        ));

        let listed = store.list_purchases(ListFilter::new()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_movement_dates_after_day() {
        let store = MemoryInventoryStore::new();
        store.insert_purchase(&purchase(1, 2, date(2025, 5, 1))).await.unwrap();
        store.insert_transfer(&transfer(TransferStatus::Pending, 3)).await.unwrap();
        store.insert_purchase(&purchase(1, 2, date(2025, 6, 1))).await.unwrap();
        store.insert_purchase(&purchase(3, 2, date(2025, 7, 1))).await.unwrap();

        let dates = store
            .movement_dates(base(1), weapon(), date(2025, 5, 1))
            .await
            .unwrap();
        assert_eq!(dates, vec![date(2025, 5, 10), date(2025, 6, 1)]);

        store.drop_source(Source::Transfers).unwrap();
        let dates = store
            .movement_dates(base(1), weapon(), date(2025, 4, 1))
            .await
            .unwrap();
        assert_eq!(dates, vec![date(2025, 5, 1), date(2025, 6, 1)]);
    }

    #[tokio::test]
    async fn test_set_transfer_status() {
        let store = MemoryInventoryStore::new();
        let id = store
            .insert_transfer(&transfer(TransferStatus::Pending, 10))
            .await
            .unwrap();

        store
            .set_transfer_status(id, TransferStatus::Completed)
            .await
            .unwrap();
        let stored = store.get_transfer(id).await.unwrap().unwrap();
        assert_eq!(stored.details.status, TransferStatus::Completed);

        let missing = store.set_transfer_status(99, TransferStatus::Completed).await;
        assert!(matches!(missing, Err(StoreError::NotFound { id: 99, .. })));
    }

    #[tokio::test]
    async fn test_listings_newest_first_with_names() {
        let store = MemoryInventoryStore::with_default_catalog();
        store.insert_purchase(&purchase(1, 2, date(2025, 5, 1))).await.unwrap();
        store.insert_purchase(&purchase(1, 2, date(2025, 6, 1))).await.unwrap();
        store.insert_purchase(&purchase(2, 1, date(2025, 7, 1))).await.unwrap();
        store.insert_transfer(&transfer(TransferStatus::Pending, 3)).await.unwrap();

        let purchases = store
            .list_purchases(ListFilter::new().with_base(base(1)))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = purchases.iter().map(|p| p.details.purchase_date).collect();
        assert_eq!(dates, vec![date(2025, 6, 1), date(2025, 5, 1)]);
        assert_eq!(purchases[0].base_name.as_deref(), Some("Alpha Base"));
        assert_eq!(purchases[0].type_name.as_deref(), Some("Weapon"));

        let transfers = store
            .list_transfers(ListFilter::new().with_base(base(2)))
            .await
            .unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].source_base_name.as_deref(), Some("Alpha Base"));
        assert_eq!(transfers[0].destination_base_name.as_deref(), Some("Beta Base"));

        let none = store
            .list_assignments(ListFilter::new().with_type(weapon()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mark_unknown_assignment_returned() {
        let store = MemoryInventoryStore::new();
        let result = store.mark_assignment_returned(42, date(2025, 5, 1)).await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 42, .. })));
    }
}
