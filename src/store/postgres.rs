//! PostgreSQL transaction store
//!
//! Each sum is a single `COALESCE(SUM(quantity), 0)` query. Date windows are
//! bound as nullable half-open bounds so one statement serves every window.
//! Multi-statement writes run in one `pool.begin()` transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use std::collections::BTreeSet;

use crate::domain::{
    Assignment, AssignmentEntry, AssignmentRecord, AssignmentStatus, Base, BaseId, EquipmentType,
    EquipmentTypeId, PurchaseEntry, PurchaseRecord, Quantity, Transfer, TransferEntry,
    TransferRecord, TransferScope, TransferStatus, UnitPrice,
};

use super::{
    DateWindow, EquipmentCatalog, ListFilter, RecordedPurchase, Source, StockLock, StoreError,
    TransactionStore,
};

const SUM_PURCHASES: &str = r#"
    SELECT COALESCE(SUM(quantity), 0)::BIGINT
    FROM purchases
    WHERE base_id = $1 AND type_id = $2
      AND ($3::date IS NULL OR purchase_date >= $3)
      AND ($4::date IS NULL OR purchase_date < $4)
"#;

const SUM_TRANSFERS_IN: &str = r#"
    SELECT COALESCE(SUM(quantity), 0)::BIGINT
    FROM transfers
    WHERE destination_base_id = $1 AND type_id = $2
      AND ($3::date IS NULL OR transfer_date >= $3)
      AND ($4::date IS NULL OR transfer_date < $4)
      AND ($5::text IS NULL OR status = $5)
"#;

const SUM_TRANSFERS_OUT: &str = r#"
    SELECT COALESCE(SUM(quantity), 0)::BIGINT
    FROM transfers
    WHERE source_base_id = $1 AND type_id = $2
      AND ($3::date IS NULL OR transfer_date >= $3)
      AND ($4::date IS NULL OR transfer_date < $4)
      AND ($5::text IS NULL OR status = $5)
"#;

const SUM_ASSIGNMENTS: &str = r#"
    SELECT COALESCE(SUM(quantity), 0)::BIGINT
    FROM assignments
    WHERE base_id = $1 AND type_id = $2
      AND ($3::date IS NULL OR assignment_date >= $3)
      AND ($4::date IS NULL OR assignment_date < $4)
"#;

const SUM_ASSIGNMENT_RETURNS: &str = r#"
    SELECT COALESCE(SUM(quantity), 0)::BIGINT
    FROM assignments
    WHERE base_id = $1 AND type_id = $2
      AND return_date IS NOT NULL
      AND ($3::date IS NULL OR return_date >= $3)
      AND ($4::date IS NULL OR return_date < $4)
"#;

const PURCHASE_DATES: &str = r#"
    SELECT DISTINCT purchase_date
    FROM purchases
    WHERE base_id = $1 AND type_id = $2 AND purchase_date > $3
"#;

const TRANSFER_DATES: &str = r#"
    SELECT DISTINCT transfer_date
    FROM transfers
    WHERE (source_base_id = $1 OR destination_base_id = $1)
      AND type_id = $2 AND transfer_date > $3
"#;

const ASSIGNMENT_DATES: &str = r#"
    SELECT assignment_date FROM assignments
    WHERE base_id = $1 AND type_id = $2 AND assignment_date > $3
    UNION
    SELECT return_date FROM assignments
    WHERE base_id = $1 AND type_id = $2 AND return_date > $3
"#;

const LIST_PURCHASES: &str = r#"
    SELECT p.purchase_id, p.base_id, p.type_id, p.quantity, p.unit_price, p.total_amount,
           p.purchase_date, p.vendor_name, p.purchase_order_number, p.created_by,
           b.base_name, et.type_name
    FROM purchases p
    LEFT JOIN bases b ON b.base_id = p.base_id
    LEFT JOIN equipment_types et ON et.type_id = p.type_id
    WHERE ($1::int IS NULL OR p.base_id = $1)
      AND ($2::int IS NULL OR p.type_id = $2)
    ORDER BY p.purchase_date DESC, p.purchase_id DESC
"#;

const LIST_TRANSFERS: &str = r#"
    SELECT t.transfer_id, t.source_base_id, t.destination_base_id, t.type_id, t.quantity,
           t.transfer_date, t.transfer_order_number, t.status,
           src.base_name, dst.base_name, et.type_name
    FROM transfers t
    LEFT JOIN bases src ON src.base_id = t.source_base_id
    LEFT JOIN bases dst ON dst.base_id = t.destination_base_id
    LEFT JOIN equipment_types et ON et.type_id = t.type_id
    WHERE ($1::int IS NULL OR t.source_base_id = $1 OR t.destination_base_id = $1)
      AND ($2::int IS NULL OR t.type_id = $2)
    ORDER BY t.transfer_date DESC, t.transfer_id DESC
"#;

const LIST_ASSIGNMENTS: &str = r#"
    SELECT a.assignment_id, a.base_id, a.type_id, a.quantity, a.assigned_to,
           a.assignment_date, a.return_date, a.status, a.notes,
           b.base_name, et.type_name
    FROM assignments a
    LEFT JOIN bases b ON b.base_id = a.base_id
    LEFT JOIN equipment_types et ON et.type_id = a.type_id
    WHERE ($1::int IS NULL OR a.base_id = $1)
      AND ($2::int IS NULL OR a.type_id = $2)
    ORDER BY a.assignment_date DESC, a.assignment_id DESC
"#;

/// Row shape of the transfers table
type TransferRow = (
    i32,
    i32,
    i32,
    i32,
    i32,
    NaiveDate,
    Option<String>,
    String,
);

/// Purchase columns followed by base and type names
type PurchaseListRow = (
    i32,
    i32,
    i32,
    i32,
    Decimal,
    Decimal,
    NaiveDate,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<String>,
    Option<String>,
);

/// Transfer columns followed by source, destination and type names
type TransferListRow = (
    i32,
    i32,
    i32,
    i32,
    i32,
    NaiveDate,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Assignment columns followed by base and type names
type AssignmentListRow = (
    i32,
    i32,
    i32,
    i32,
    i32,
    NaiveDate,
    Option<NaiveDate>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Row shape of the assignments table
type AssignmentRow = (
    i32,
    i32,
    i32,
    i32,
    i32,
    NaiveDate,
    Option<NaiveDate>,
    String,
    Option<String>,
);

/// Transaction store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    /// Create a new PgInventoryStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run one of the sum statements.
    /// Transfer statements take the status filter as a fifth parameter.
    async fn fetch_sum(
        &self,
        source: Source,
        sql: &'static str,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: Option<TransferScope>,
    ) -> Result<i64, StoreError> {
        let (lower, upper) = window.bounds();

        let mut query = sqlx::query_scalar::<_, i64>(sql)
            .bind(base.value())
            .bind(equipment_type.value())
            .bind(lower)
            .bind(upper);
        if let Some(scope) = scope {
            query = query.bind(scope.required_status());
        }

        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, source))
    }

    /// Run one of the movement date statements; a missing table yields none
    async fn fetch_dates(
        &self,
        source: Source,
        sql: &'static str,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        after: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let result = sqlx::query_scalar::<_, NaiveDate>(sql)
            .bind(base.value())
            .bind(equipment_type.value())
            .bind(after)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, source));

        match result {
            Err(StoreError::SourceUnavailable(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Advisory transaction lock on (source base, type), released on commit or drop
struct PgStockLock {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockLock for PgStockLock {
    async fn insert_transfer(
        self: Box<Self>,
        transfer: &TransferRecord,
    ) -> Result<i32, StoreError> {
        let PgStockLock { mut tx } = *self;
        let transfer_id = insert_transfer_with(&mut *tx, transfer).await?;
        tx.commit().await?;
        Ok(transfer_id)
    }
}

async fn insert_purchase_with<'e, E>(
    executor: E,
    purchase: &PurchaseRecord,
) -> Result<i32, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let total_amount: Decimal = purchase.total_amount();

    sqlx::query_scalar(
        r#"
        INSERT INTO purchases
            (base_id, type_id, quantity, unit_price, total_amount, purchase_date,
             vendor_name, purchase_order_number, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING purchase_id
        "#,
    )
    .bind(purchase.base_id.value())
    .bind(purchase.type_id.value())
    .bind(purchase.quantity.value())
    .bind(purchase.unit_price.value())
    .bind(total_amount)
    .bind(purchase.purchase_date)
    .bind(&purchase.vendor_name)
    .bind(&purchase.purchase_order_number)
    .bind(purchase.created_by)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx(e, Source::Purchases))
}

async fn insert_transfer_with<'e, E>(
    executor: E,
    transfer: &TransferRecord,
) -> Result<i32, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO transfers
            (source_base_id, destination_base_id, type_id, quantity, transfer_date,
             transfer_order_number, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING transfer_id
        "#,
    )
    .bind(transfer.source_base_id.value())
    .bind(transfer.destination_base_id.value())
    .bind(transfer.type_id.value())
    .bind(transfer.quantity.value())
    .bind(transfer.transfer_date)
    .bind(&transfer.transfer_order_number)
    .bind(transfer.status.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx(e, Source::Transfers))
}

/// Returns true when the placeholder row was created
async fn insert_placeholder_base<'e, E>(executor: E, base: BaseId) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let placeholder = Base::placeholder(base);

    let rows_affected = sqlx::query(
        r#"
        INSERT INTO bases (base_id, base_name, location)
        VALUES ($1, $2, $3)
        ON CONFLICT (base_id) DO NOTHING
        "#,
    )
    .bind(base.value())
    .bind(&placeholder.base_name)
    .bind(&placeholder.location)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx(e, Source::Bases))?
    .rows_affected();

    Ok(rows_affected > 0)
}

async fn insert_placeholder_type<'e, E>(
    executor: E,
    equipment_type: EquipmentTypeId,
) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let placeholder = EquipmentType::placeholder(equipment_type);

    let rows_affected = sqlx::query(
        r#"
        INSERT INTO equipment_types (type_id, type_name, category)
        VALUES ($1, $2, $3)
        ON CONFLICT (type_id) DO NOTHING
        "#,
    )
    .bind(equipment_type.value())
    .bind(&placeholder.type_name)
    .bind(&placeholder.category)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx(e, Source::EquipmentTypes))?
    .rows_affected();

    Ok(rows_affected > 0)
}

fn filter_binds(filter: ListFilter) -> (Option<i32>, Option<i32>) {
    (
        filter.base_id.map(|b| b.value()),
        filter.type_id.map(|t| t.value()),
    )
}

fn transfer_from_row(row: TransferRow) -> Result<Transfer, StoreError> {
    let (
        transfer_id,
        source_base_id,
        destination_base_id,
        type_id,
        quantity,
        transfer_date,
        transfer_order_number,
        status,
    ) = row;

    let corrupt =
        |what: String| StoreError::Internal(format!("transfer {} has {}", transfer_id, what));

    Ok(Transfer {
        transfer_id,
        details: TransferRecord {
            source_base_id: BaseId::new(source_base_id.into())
                .map_err(|e| corrupt(e.to_string()))?,
            destination_base_id: BaseId::new(destination_base_id.into())
                .map_err(|e| corrupt(e.to_string()))?,
            type_id: EquipmentTypeId::new(type_id.into()).map_err(|e| corrupt(e.to_string()))?,
            quantity: Quantity::new(quantity.into()).map_err(|e| corrupt(e.to_string()))?,
            transfer_date,
            transfer_order_number,
            status: status
                .parse::<TransferStatus>()
                .map_err(|e| corrupt(e.to_string()))?,
        },
    })
}

fn purchase_entry_from_row(row: PurchaseListRow) -> Result<PurchaseEntry, StoreError> {
    let (
        purchase_id,
        base_id,
        type_id,
        quantity,
        unit_price,
        total_amount,
        purchase_date,
        vendor_name,
        purchase_order_number,
        created_by,
        base_name,
        type_name,
    ) = row;

    let corrupt =
        |what: String| StoreError::Internal(format!("purchase {} has {}", purchase_id, what));

    Ok(PurchaseEntry {
        purchase_id,
        details: PurchaseRecord {
            base_id: BaseId::new(base_id.into()).map_err(|e| corrupt(e.to_string()))?,
            type_id: EquipmentTypeId::new(type_id.into()).map_err(|e| corrupt(e.to_string()))?,
            quantity: Quantity::new(quantity.into()).map_err(|e| corrupt(e.to_string()))?,
            unit_price: UnitPrice::new(unit_price).map_err(|e| corrupt(e.to_string()))?,
            purchase_date,
            vendor_name,
            purchase_order_number,
            created_by,
        },
        total_amount,
        base_name,
        type_name,
    })
}

fn assignment_from_row(row: AssignmentRow) -> Result<Assignment, StoreError> {
    let (
        assignment_id,
        base_id,
        type_id,
        quantity,
        assigned_to,
        assignment_date,
        return_date,
        status,
        notes,
    ) = row;

    let corrupt = |what: String| {
        StoreError::Internal(format!("assignment {} has {}", assignment_id, what))
    };

    Ok(Assignment {
        assignment_id,
        details: AssignmentRecord {
            base_id: BaseId::new(base_id.into()).map_err(|e| corrupt(e.to_string()))?,
            type_id: EquipmentTypeId::new(type_id.into()).map_err(|e| corrupt(e.to_string()))?,
            quantity: Quantity::new(quantity.into()).map_err(|e| corrupt(e.to_string()))?,
            assigned_to,
            assignment_date,
            return_date,
            status: status
                .parse::<AssignmentStatus>()
                .map_err(|e| corrupt(e.to_string()))?,
            notes,
        },
    })
}

#[async_trait]
impl TransactionStore for PgInventoryStore {
    async fn sum_purchases(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        self.fetch_sum(Source::Purchases, SUM_PURCHASES, base, equipment_type, window, None)
            .await
    }

    async fn sum_transfers_in(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError> {
        self.fetch_sum(
            Source::Transfers,
            SUM_TRANSFERS_IN,
            base,
            equipment_type,
            window,
            Some(scope),
        )
        .await
    }

    async fn sum_transfers_out(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
        scope: TransferScope,
    ) -> Result<i64, StoreError> {
        self.fetch_sum(
            Source::Transfers,
            SUM_TRANSFERS_OUT,
            base,
            equipment_type,
            window,
            Some(scope),
        )
        .await
    }

    async fn sum_assignments(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        self.fetch_sum(Source::Assignments, SUM_ASSIGNMENTS, base, equipment_type, window, None)
            .await
    }

    async fn sum_assignment_returns(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        window: DateWindow,
    ) -> Result<i64, StoreError> {
        self.fetch_sum(
            Source::Assignments,
            SUM_ASSIGNMENT_RETURNS,
            base,
            equipment_type,
            window,
            None,
        )
        .await
    }

    async fn movement_dates(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
        after: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let (purchases, transfers, assignments) = tokio::try_join!(
            self.fetch_dates(Source::Purchases, PURCHASE_DATES, base, equipment_type, after),
            self.fetch_dates(Source::Transfers, TRANSFER_DATES, base, equipment_type, after),
            self.fetch_dates(Source::Assignments, ASSIGNMENT_DATES, base, equipment_type, after),
        )?;

        let dates: BTreeSet<NaiveDate> = purchases
            .into_iter()
            .chain(transfers)
            .chain(assignments)
            .collect();
        Ok(dates.into_iter().collect())
    }

    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> Result<i32, StoreError> {
        insert_purchase_with(&self.pool, purchase).await
    }

    async fn record_purchase(
        &self,
        purchase: &PurchaseRecord,
    ) -> Result<RecordedPurchase, StoreError> {
        let mut tx = self.pool.begin().await?;

        let created_base = insert_placeholder_base(&mut *tx, purchase.base_id).await?;
        let created_type = insert_placeholder_type(&mut *tx, purchase.type_id).await?;
        let purchase_id = insert_purchase_with(&mut *tx, purchase).await?;

        tx.commit().await?;

        Ok(RecordedPurchase {
            purchase_id,
            created_base,
            created_type,
        })
    }

    async fn insert_transfer(&self, transfer: &TransferRecord) -> Result<i32, StoreError> {
        insert_transfer_with(&self.pool, transfer).await
    }

    async fn lock_stock(
        &self,
        base: BaseId,
        equipment_type: EquipmentTypeId,
    ) -> Result<Box<dyn StockLock>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(base.value())
            .bind(equipment_type.value())
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgStockLock { tx }))
    }

    async fn get_transfer(&self, transfer_id: i32) -> Result<Option<Transfer>, StoreError> {
        let row: Option<TransferRow> = sqlx::query_as(
            r#"
            SELECT transfer_id, source_base_id, destination_base_id, type_id, quantity,
                   transfer_date, transfer_order_number, status
            FROM transfers
            WHERE transfer_id = $1
            "#,
        )
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::Transfers))?;

        row.map(transfer_from_row).transpose()
    }

    async fn set_transfer_status(
        &self,
        transfer_id: i32,
        status: TransferStatus,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query("UPDATE transfers SET status = $2 WHERE transfer_id = $1")
            .bind(transfer_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, Source::Transfers))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Transfer",
                id: transfer_id.into(),
            });
        }

        Ok(())
    }

    async fn insert_assignment(&self, assignment: &AssignmentRecord) -> Result<i32, StoreError> {
        sqlx::query_scalar(
            r#"
            INSERT INTO assignments
                (base_id, type_id, quantity, assigned_to, assignment_date, return_date,
                 status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING assignment_id
            "#,
        )
        .bind(assignment.base_id.value())
        .bind(assignment.type_id.value())
        .bind(assignment.quantity.value())
        .bind(assignment.assigned_to)
        .bind(assignment.assignment_date)
        .bind(assignment.return_date)
        .bind(assignment.status.as_str())
        .bind(&assignment.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::Assignments))
    }

    async fn get_assignment(&self, assignment_id: i32) -> Result<Option<Assignment>, StoreError> {
        let row: Option<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT assignment_id, base_id, type_id, quantity, assigned_to,
                   assignment_date, return_date, status, notes
            FROM assignments
            WHERE assignment_id = $1
            "#,
        )
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::Assignments))?;

        row.map(assignment_from_row).transpose()
    }

    async fn mark_assignment_returned(
        &self,
        assignment_id: i32,
        return_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE assignments
            SET return_date = $2, status = $3
            WHERE assignment_id = $1
            "#,
        )
        .bind(assignment_id)
        .bind(return_date)
        .bind(AssignmentStatus::Returned.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::Assignments))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Assignment",
                id: assignment_id.into(),
            });
        }

        Ok(())
    }

    async fn list_purchases(&self, filter: ListFilter) -> Result<Vec<PurchaseEntry>, StoreError> {
        let (base_id, type_id) = filter_binds(filter);

        let rows: Vec<PurchaseListRow> = sqlx::query_as(LIST_PURCHASES)
            .bind(base_id)
            .bind(type_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, Source::Purchases))?;

        rows.into_iter().map(purchase_entry_from_row).collect()
    }

    async fn list_transfers(&self, filter: ListFilter) -> Result<Vec<TransferEntry>, StoreError> {
        let (base_id, type_id) = filter_binds(filter);

        let rows: Vec<TransferListRow> = sqlx::query_as(LIST_TRANSFERS)
            .bind(base_id)
            .bind(type_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, Source::Transfers))?;

        rows.into_iter()
            .map(|row| -> Result<TransferEntry, StoreError> {
                let (id, src, dst, ty, qty, day, order, status, src_name, dst_name, type_name) =
                    row;
                Ok(TransferEntry {
                    transfer: transfer_from_row((id, src, dst, ty, qty, day, order, status))?,
                    source_base_name: src_name,
                    destination_base_name: dst_name,
                    type_name,
                })
            })
            .collect()
    }

    async fn list_assignments(
        &self,
        filter: ListFilter,
    ) -> Result<Vec<AssignmentEntry>, StoreError> {
        let (base_id, type_id) = filter_binds(filter);

        let rows: Vec<AssignmentListRow> = sqlx::query_as(LIST_ASSIGNMENTS)
            .bind(base_id)
            .bind(type_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, Source::Assignments))?;

        rows.into_iter()
            .map(|row| -> Result<AssignmentEntry, StoreError> {
                let (id, base, ty, qty, to, day, returned, status, notes, base_name, type_name) =
                    row;
                Ok(AssignmentEntry {
                    assignment: assignment_from_row((
                        id, base, ty, qty, to, day, returned, status, notes,
                    ))?,
                    base_name,
                    type_name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl EquipmentCatalog for PgInventoryStore {
    async fn equipment_types(&self) -> Result<Vec<EquipmentType>, StoreError> {
        let rows: Vec<(i32, String, Option<String>)> = sqlx::query_as(
            "SELECT type_id, type_name, category FROM equipment_types ORDER BY type_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::EquipmentTypes))?;

        rows.into_iter()
            .map(|(type_id, type_name, category)| -> Result<EquipmentType, StoreError> {
                let type_id = EquipmentTypeId::new(type_id.into())
                    .map_err(|e| StoreError::Internal(e.to_string()))?;
                Ok(EquipmentType {
                    type_id,
                    type_name,
                    category,
                })
            })
            .collect()
    }

    async fn bases(&self) -> Result<Vec<Base>, StoreError> {
        let rows: Vec<(i32, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT base_id, base_name, location, commander FROM bases ORDER BY base_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Source::Bases))?;

        rows.into_iter()
            .map(|(base_id, base_name, location, commander)| -> Result<Base, StoreError> {
                let base_id =
                    BaseId::new(base_id.into()).map_err(|e| StoreError::Internal(e.to_string()))?;
                Ok(Base {
                    base_id,
                    base_name,
                    location,
                    commander,
                })
            })
            .collect()
    }
}
