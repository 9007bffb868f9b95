//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use military_assets::domain::{BaseId, EquipmentTypeId, OperationContext, Period};
use military_assets::handlers::{
    AssignmentHandler, PurchaseHandler, RecordAssignmentCommand, RecordPurchaseCommand,
    RecordTransferCommand, TransferHandler,
};
use military_assets::store::{EquipmentCatalog, MemoryInventoryStore, TransactionStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const ALPHA: i64 = 1;
pub const BETA: i64 = 2;
pub const WEAPON: i64 = 2;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn period(start: NaiveDate, end: NaiveDate) -> Period {
    Period::new(start, end).unwrap()
}

pub fn base(id: i64) -> BaseId {
    BaseId::new(id).unwrap()
}

pub fn equipment_type(id: i64) -> EquipmentTypeId {
    EquipmentTypeId::new(id).unwrap()
}

pub fn context() -> OperationContext {
    OperationContext::new().with_actor(1)
}

/// In-memory store seeded with the default bases and equipment types
pub fn memory_store() -> Arc<MemoryInventoryStore> {
    Arc::new(MemoryInventoryStore::with_default_catalog())
}

pub async fn purchase<S>(store: &Arc<S>, base_id: i64, type_id: i64, quantity: i64, day: NaiveDate)
where
    S: TransactionStore + EquipmentCatalog,
{
    PurchaseHandler::new(Arc::clone(store))
        .execute(
            RecordPurchaseCommand::new(base_id, type_id, quantity, "100.00".to_string(), day),
            &context(),
        )
        .await
        .expect("Failed to record purchase");
}

pub async fn transfer<S>(
    store: &Arc<S>,
    from: i64,
    to: i64,
    type_id: i64,
    quantity: i64,
    day: NaiveDate,
) where
    S: TransactionStore + EquipmentCatalog + 'static,
{
    TransferHandler::new(Arc::clone(store))
        .execute(
            RecordTransferCommand::new(from, to, type_id, quantity, day),
            &context(),
        )
        .await
        .expect("Failed to record transfer");
}

pub async fn assign<S>(
    store: &Arc<S>,
    base_id: i64,
    type_id: i64,
    quantity: i64,
    day: NaiveDate,
) -> i32
where
    S: TransactionStore,
{
    AssignmentHandler::new(Arc::clone(store))
        .execute(
            RecordAssignmentCommand::new(base_id, type_id, quantity, 7, day),
            &context(),
        )
        .await
        .expect("Failed to record assignment")
        .assignment_id
}

/// Connect to DATABASE_URL and apply the schema.
///
/// Returns `None` when DATABASE_URL is unset so database tests can skip.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    military_assets::db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");

    Some(pool)
}

/// Fresh base ids so database tests never see each other's rows
pub fn unique_base_pair() -> (i64, i64) {
    use rand::Rng;

    let first = rand::thread_rng().gen_range(10_000..1_000_000_000i64);
    (first, first + 1)
}
