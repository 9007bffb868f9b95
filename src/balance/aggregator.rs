//! Balance Aggregator
//!
//! Derives opening and closing balances from raw movement records. Every
//! call is stateless: it reads the current store contents and returns fresh
//! snapshots.

use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::domain::{BalancePolicy, BaseId, EquipmentTypeId, Period, ReturnPolicy};
use crate::error::{AppError, AppResult};
use crate::store::{DateWindow, EquipmentCatalog, StoreError, TransactionStore};

use super::{BalanceSnapshot, Movements};

/// Name reported for a requested type missing from the catalog
pub const UNKNOWN_TYPE_NAME: &str = "Unknown Type";

/// A validated balance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceQuery {
    pub base_id: BaseId,
    pub period: Period,
    /// Restrict to one type; `None` reports every catalog type
    pub equipment_type_id: Option<EquipmentTypeId>,
}

impl BalanceQuery {
    pub fn new(base_id: BaseId, period: Period) -> Self {
        Self {
            base_id,
            period,
            equipment_type_id: None,
        }
    }

    pub fn with_equipment_type(mut self, equipment_type_id: EquipmentTypeId) -> Self {
        self.equipment_type_id = Some(equipment_type_id);
        self
    }

    /// Validate raw request values, failing before any store read
    pub fn parse(
        base_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        equipment_type_id: Option<i64>,
    ) -> AppResult<Self> {
        let invalid = |e: crate::domain::DomainError| AppError::InvalidRequest(e.to_string());

        let base_id = BaseId::new(base_id).map_err(invalid)?;
        let period = Period::new(period_start, period_end).map_err(invalid)?;
        let query = Self::new(base_id, period);

        match equipment_type_id {
            Some(id) => Ok(query.with_equipment_type(EquipmentTypeId::new(id).map_err(invalid)?)),
            None => Ok(query),
        }
    }
}

/// Computes balance snapshots over a transaction store
pub struct BalanceAggregator<S> {
    store: Arc<S>,
    policy: BalancePolicy,
}

impl<S> Clone for BalanceAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S> BalanceAggregator<S>
where
    S: TransactionStore + EquipmentCatalog + 'static,
{
    /// Create an aggregator with the default policy
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: BalancePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BalancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // get_balances
    // =========================================================================

    /// One snapshot per equipment type, in catalog order.
    ///
    /// Types are computed concurrently. A source whose table is missing counts
    /// as zero; any other store failure fails the whole request.
    pub async fn get_balances(&self, query: &BalanceQuery) -> AppResult<Vec<BalanceSnapshot>> {
        let started = Instant::now();
        let targets = self.resolve_types(query.equipment_type_id).await?;

        let mut tasks = JoinSet::new();
        for (index, (type_id, type_name)) in targets.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let policy = self.policy;
            let base_id = query.base_id;
            let period = query.period;

            tasks.spawn(async move {
                let result =
                    snapshot_for(store.as_ref(), policy, base_id, type_id, type_name, period).await;
                (index, result)
            });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| AppError::Internal(format!("balance task failed: {}", e)))?;
            indexed.push((index, result?));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let snapshots: Vec<BalanceSnapshot> =
            indexed.into_iter().map(|(_, snapshot)| snapshot).collect();

        if snapshots.iter().all(BalanceSnapshot::is_empty) {
            tracing::debug!(
                base_id = %query.base_id,
                period = %query.period,
                "No movements recorded, returning zero balances"
            );
        }

        tracing::info!(
            base_id = %query.base_id,
            period = %query.period,
            equipment_types = snapshots.len(),
            days = query.period.days(),
            duration_ms = %started.elapsed().as_millis(),
            "Balances computed"
        );

        Ok(snapshots)
    }

    // =========================================================================
    // stock_on_hand
    // =========================================================================

    /// Stock at `base` including every record dated on or before `as_of`
    pub async fn stock_on_hand(
        &self,
        base_id: BaseId,
        equipment_type_id: EquipmentTypeId,
        as_of: NaiveDate,
    ) -> AppResult<i64> {
        let totals = movements(
            self.store.as_ref(),
            self.policy,
            base_id,
            equipment_type_id,
            DateWindow::Through(as_of),
        )
        .await?;

        Ok(totals.stock_change())
    }

    /// Lowest stock on hand from `from` onward: on `from` itself and at the
    /// end of every later day on which this base and type move.
    ///
    /// Taking this much out on `from` keeps every later balance non-negative.
    pub async fn minimum_stock_from(
        &self,
        base_id: BaseId,
        equipment_type_id: EquipmentTypeId,
        from: NaiveDate,
    ) -> AppResult<i64> {
        let later_days = self
            .store
            .movement_dates(base_id, equipment_type_id, from)
            .await?;

        let mut lowest = self.stock_on_hand(base_id, equipment_type_id, from).await?;
        for day in later_days {
            lowest = lowest.min(self.stock_on_hand(base_id, equipment_type_id, day).await?);
        }

        tracing::debug!(
            base_id = %base_id,
            type_id = %equipment_type_id,
            from = %from,
            lowest,
            "Minimum stock computed"
        );

        Ok(lowest)
    }

    /// Pair each requested type id with its display name
    async fn resolve_types(
        &self,
        requested: Option<EquipmentTypeId>,
    ) -> AppResult<Vec<(EquipmentTypeId, String)>> {
        let catalog = match self.store.equipment_types().await {
            Ok(catalog) => catalog,
            // A single requested type can still be summed without names
            Err(StoreError::SourceUnavailable(source)) if requested.is_some() => {
                tracing::warn!(source = %source, "Equipment catalog unavailable");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let targets = match requested {
            Some(type_id) => {
                let type_name = catalog
                    .into_iter()
                    .find(|t| t.type_id == type_id)
                    .map(|t| t.type_name)
                    .unwrap_or_else(|| UNKNOWN_TYPE_NAME.to_string());
                vec![(type_id, type_name)]
            }
            None => catalog
                .into_iter()
                .map(|t| (t.type_id, t.type_name))
                .collect(),
        };

        Ok(targets)
    }
}

/// Opening balance from everything before the period, then the period's movements
async fn snapshot_for<S>(
    store: &S,
    policy: BalancePolicy,
    base_id: BaseId,
    type_id: EquipmentTypeId,
    type_name: String,
    period: Period,
) -> Result<BalanceSnapshot, StoreError>
where
    S: TransactionStore + ?Sized,
{
    let (prior, during) = tokio::try_join!(
        movements(store, policy, base_id, type_id, DateWindow::Before(period.start())),
        movements(
            store,
            policy,
            base_id,
            type_id,
            DateWindow::Between(period.start(), period.end())
        ),
    )?;

    Ok(BalanceSnapshot::new(
        base_id,
        type_id,
        type_name,
        period,
        prior.stock_change(),
        during,
    ))
}

/// All movement sums for one window, issued concurrently
async fn movements<S>(
    store: &S,
    policy: BalancePolicy,
    base_id: BaseId,
    type_id: EquipmentTypeId,
    window: DateWindow,
) -> Result<Movements, StoreError>
where
    S: TransactionStore + ?Sized,
{
    let scope = policy.transfer_scope;
    let returns = async {
        match policy.return_policy {
            ReturnPolicy::Ignore => Ok(0),
            ReturnPolicy::Restore => store.sum_assignment_returns(base_id, type_id, window).await,
        }
    };

    let (purchased, transferred_in, transferred_out, assigned, returned) = tokio::try_join!(
        or_zero(store.sum_purchases(base_id, type_id, window)),
        or_zero(store.sum_transfers_in(base_id, type_id, window, scope)),
        or_zero(store.sum_transfers_out(base_id, type_id, window, scope)),
        or_zero(store.sum_assignments(base_id, type_id, window)),
        or_zero(returns),
    )?;

    Ok(Movements {
        purchased,
        transferred_in,
        transferred_out,
        assigned,
        returned,
    })
}

/// A source without a backing table contributes nothing
async fn or_zero<F>(sum: F) -> Result<i64, StoreError>
where
    F: Future<Output = Result<i64, StoreError>>,
{
    match sum.await {
        Err(StoreError::SourceUnavailable(source)) => {
            tracing::debug!(source = %source, "Source table missing, counting as zero");
            Ok(0)
        }
        other => other,
    }
}
