//! Database module
//!
//! Connection checks and schema setup.

use sqlx::{Executor, PgPool};

use crate::store::Source;

/// Schema and catalog seed, safe to apply repeatedly
const INVENTORY_SCHEMA: &str = include_str!("../migrations/0001_inventory.sql");

const REQUIRED_SOURCES: [Source; 5] = [
    Source::Bases,
    Source::EquipmentTypes,
    Source::Purchases,
    Source::Transfers,
    Source::Assignments,
];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Tables that have not been created yet
pub async fn missing_tables(pool: &PgPool) -> Result<Vec<Source>, sqlx::Error> {
    let mut missing = Vec::new();

    for source in REQUIRED_SOURCES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(source.table_name())
        .fetch_one(pool)
        .await?;

        if !exists {
            missing.push(source);
        }
    }

    Ok(missing)
}

/// Check if required tables exist.
///
/// Missing tables are not fatal: balances treat their sources as empty.
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let missing = missing_tables(pool).await?;

    for source in &missing {
        tracing::warn!("Table '{}' does not exist, its records count as zero", source);
    }

    Ok(missing.is_empty())
}

/// Create any missing tables and seed the default catalog
pub async fn initialize_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    (&mut *tx).execute(INVENTORY_SCHEMA).await?;
    tx.commit().await?;

    tracing::info!("Inventory schema initialized");
    Ok(())
}
