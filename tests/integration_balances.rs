//! Integration tests for balance reporting over the in-memory store

use std::sync::Arc;

use military_assets::balance::{BalanceAggregator, BalanceQuery};
use military_assets::domain::{
    AvailabilityMode, BalancePolicy, DomainError, ReturnPolicy, TransferScope, TransferStatus,
};
use military_assets::handlers::{
    AssignmentHandler, RecordTransferCommand, ReturnAssignmentCommand, TransferHandler,
};
use military_assets::store::{ListFilter, MemoryInventoryStore, Source, TransactionStore};
use military_assets::AppError;
use tokio_test::assert_ok;

mod common;
use common::*;

async fn weapon_snapshot(
    store: &Arc<MemoryInventoryStore>,
    base_id: i64,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> military_assets::BalanceSnapshot {
    let query = BalanceQuery::parse(base_id, start, end, Some(WEAPON)).unwrap();
    let mut snapshots = BalanceAggregator::new(Arc::clone(store))
        .get_balances(&query)
        .await
        .unwrap();
    snapshots.remove(0)
}

// =========================================================================
// Reference scenarios
// =========================================================================

#[tokio::test]
async fn test_purchases_across_window_boundary() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 50, date(2025, 4, 1)).await;
    purchase(&store, ALPHA, WEAPON, 20, date(2025, 5, 5)).await;

    let snap = weapon_snapshot(&store, ALPHA, date(2025, 5, 1), date(2025, 5, 31)).await;

    assert_eq!(snap.opening_balance, 50);
    assert_eq!(snap.purchased, 20);
    assert_eq!(snap.closing_balance, 70);
    assert_eq!(snap.net_movement, 20);
}

#[tokio::test]
async fn test_transfer_between_bases() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 70, date(2025, 4, 1)).await;
    transfer(&store, ALPHA, BETA, WEAPON, 10, date(2025, 6, 10)).await;

    let alpha = weapon_snapshot(&store, ALPHA, date(2025, 6, 1), date(2025, 6, 30)).await;
    assert_eq!(alpha.opening_balance, 70);
    assert_eq!(alpha.transferred_out, 10);
    assert_eq!(alpha.closing_balance, 60);

    let beta = weapon_snapshot(&store, BETA, date(2025, 6, 1), date(2025, 6, 30)).await;
    assert_eq!(beta.opening_balance, 0);
    assert_eq!(beta.transferred_in, 10);
    assert_eq!(beta.closing_balance, 10);
}

#[tokio::test]
async fn test_assignment_excluded_from_net_movement() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 20, date(2025, 5, 2)).await;
    transfer(&store, BETA, ALPHA, WEAPON, 5, date(2025, 5, 3)).await;

    let before = weapon_snapshot(&store, ALPHA, date(2025, 5, 1), date(2025, 5, 31)).await;
    assign(&store, ALPHA, WEAPON, 15, date(2025, 5, 20)).await;
    let after = weapon_snapshot(&store, ALPHA, date(2025, 5, 1), date(2025, 5, 31)).await;

    assert_eq!(after.closing_balance, before.closing_balance - 15);
    assert_eq!(after.net_movement, before.net_movement);
    assert_eq!(after.assigned, 15);
}

#[tokio::test]
async fn test_unused_type_yields_zero_snapshot() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 50, date(2025, 4, 1)).await;

    let query = BalanceQuery::parse(ALPHA, date(2025, 5, 1), date(2025, 5, 31), Some(5)).unwrap();
    let snapshots = BalanceAggregator::new(store).get_balances(&query).await.unwrap();

    assert_eq!(snapshots.len(), 1);
    let snap = &snapshots[0];
    assert_eq!(snap.type_name, "Uniform");
    assert_eq!(snap.opening_balance, 0);
    assert_eq!(snap.closing_balance, 0);
    assert_eq!(snap.net_movement, 0);
    assert_eq!(snap.percent_change, 0.0);
}

// =========================================================================
// Laws
// =========================================================================

#[tokio::test]
async fn test_continuity_between_consecutive_periods() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 40, date(2025, 3, 15)).await;
    purchase(&store, ALPHA, WEAPON, 12, date(2025, 4, 30)).await;
    transfer(&store, ALPHA, BETA, WEAPON, 7, date(2025, 5, 1)).await;
    assign(&store, ALPHA, WEAPON, 3, date(2025, 5, 31)).await;
    purchase(&store, ALPHA, WEAPON, 9, date(2025, 6, 1)).await;

    let april = period(date(2025, 4, 1), date(2025, 4, 30));
    let may = april.following_until(date(2025, 5, 31)).unwrap();
    let june = may.following_until(date(2025, 6, 30)).unwrap();

    let april_snap = weapon_snapshot(&store, ALPHA, april.start(), april.end()).await;
    let may_snap = weapon_snapshot(&store, ALPHA, may.start(), may.end()).await;
    let june_snap = weapon_snapshot(&store, ALPHA, june.start(), june.end()).await;

    assert_eq!(may_snap.opening_balance, april_snap.closing_balance);
    assert_eq!(june_snap.opening_balance, may_snap.closing_balance);

    for snap in [&april_snap, &may_snap, &june_snap] {
        assert_eq!(
            snap.closing_balance,
            snap.opening_balance + snap.purchased + snap.transferred_in
                - snap.transferred_out
                - snap.assigned
        );
    }
}

#[tokio::test]
async fn test_repeated_query_is_identical() {
    let store = memory_store();
    purchase(&store, ALPHA, 1, 8, date(2025, 5, 1)).await;
    purchase(&store, ALPHA, WEAPON, 30, date(2025, 5, 9)).await;
    assign(&store, ALPHA, WEAPON, 4, date(2025, 5, 10)).await;

    let aggregator = BalanceAggregator::new(store);
    let query = BalanceQuery::parse(ALPHA, date(2025, 5, 1), date(2025, 5, 31), None).unwrap();

    let first = aggregator.get_balances(&query).await.unwrap();
    let second = aggregator.get_balances(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[tokio::test]
async fn test_single_day_period() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 3, date(2025, 5, 9)).await;
    purchase(&store, ALPHA, WEAPON, 5, date(2025, 5, 10)).await;
    purchase(&store, ALPHA, WEAPON, 7, date(2025, 5, 11)).await;

    let snap = weapon_snapshot(&store, ALPHA, date(2025, 5, 10), date(2025, 5, 10)).await;

    assert_eq!(snap.opening_balance, 3);
    assert_eq!(snap.purchased, 5);
    assert_eq!(snap.closing_balance, 8);
}

#[tokio::test]
async fn test_zero_opening_has_zero_percent_change() {
    let store = memory_store();
    purchase(&store, BETA, WEAPON, 40, date(2025, 5, 5)).await;

    let snap = weapon_snapshot(&store, BETA, date(2025, 5, 1), date(2025, 5, 31)).await;

    assert_eq!(snap.opening_balance, 0);
    assert_eq!(snap.closing_balance, 40);
    assert_eq!(snap.percent_change, 0.0);
}

// =========================================================================
// Errors and missing data
// =========================================================================

#[tokio::test]
async fn test_inverted_period_rejected() {
    let result = BalanceQuery::parse(ALPHA, date(2025, 6, 1), date(2025, 5, 1), None);

    match result {
        Err(AppError::InvalidRequest(msg)) => assert!(msg.contains("2025-06-01")),
        other => panic!("Expected InvalidRequest, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_purchases_table_counts_as_zero() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 50, date(2025, 4, 1)).await;
    assign(&store, ALPHA, WEAPON, 5, date(2025, 5, 2)).await;
    store.drop_source(Source::Purchases).unwrap();

    let snap = weapon_snapshot(&store, ALPHA, date(2025, 5, 1), date(2025, 5, 31)).await;

    assert_eq!(snap.opening_balance, 0);
    assert_eq!(snap.purchased, 0);
    assert_eq!(snap.closing_balance, -5);
}

// =========================================================================
// Policies
// =========================================================================

#[tokio::test]
async fn test_cancelled_transfer_only_excluded_when_settled() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 30, date(2025, 4, 1)).await;
    TransferHandler::new(Arc::clone(&store))
        .execute(
            RecordTransferCommand::new(ALPHA, BETA, WEAPON, 10, date(2025, 5, 5))
                .with_status(TransferStatus::Cancelled),
            &context(),
        )
        .await
        .unwrap();

    let query =
        BalanceQuery::parse(BETA, date(2025, 5, 1), date(2025, 5, 31), Some(WEAPON)).unwrap();

    let all = BalanceAggregator::new(Arc::clone(&store))
        .get_balances(&query)
        .await
        .unwrap();
    assert_eq!(all[0].transferred_in, 10);

    let settled = BalanceAggregator::new(store)
        .with_policy(BalancePolicy::default().with_transfer_scope(TransferScope::Settled))
        .get_balances(&query)
        .await
        .unwrap();
    assert_eq!(settled[0].transferred_in, 0);
}

#[tokio::test]
async fn test_returned_assignment_restores_stock_when_enabled() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 30, date(2025, 4, 1)).await;
    let assignment_id = assign(&store, ALPHA, WEAPON, 10, date(2025, 4, 15)).await;
    assert_ok!(
        AssignmentHandler::new(Arc::clone(&store))
            .return_assignment(
                ReturnAssignmentCommand::new(assignment_id, date(2025, 5, 20)),
                &context(),
            )
            .await
    );

    let query =
        BalanceQuery::parse(ALPHA, date(2025, 5, 1), date(2025, 5, 31), Some(WEAPON)).unwrap();
    let restore = BalanceAggregator::new(store)
        .with_policy(BalancePolicy::default().with_return_policy(ReturnPolicy::Restore));
    let snapshots = restore.get_balances(&query).await.unwrap();
    let snap = &snapshots[0];

    assert_eq!(snap.opening_balance, 20);
    assert_eq!(snap.returned, 10);
    assert_eq!(snap.closing_balance, 30);
}

#[tokio::test]
async fn test_strict_mode_blocks_overdraw() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 5, date(2025, 5, 1)).await;

    let strict =
        TransferHandler::new(Arc::clone(&store)).with_availability(AvailabilityMode::Strict);
    let result = strict
        .execute(
            RecordTransferCommand::new(ALPHA, BETA, WEAPON, 6, date(2025, 5, 2)),
            &context(),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::InsufficientStock { .. }))
    ));

    let permissive = TransferHandler::new(Arc::clone(&store));
    assert_ok!(
        permissive
            .execute(
                RecordTransferCommand::new(ALPHA, BETA, WEAPON, 6, date(2025, 5, 2)),
                &context(),
            )
            .await
    );

    let snap = weapon_snapshot(&store, ALPHA, date(2025, 5, 1), date(2025, 5, 31)).await;
    assert_eq!(snap.closing_balance, -1);
}

// =========================================================================
// History
// =========================================================================

#[tokio::test]
async fn test_history_filters_and_orders_newest_first() {
    let store = memory_store();
    purchase(&store, ALPHA, WEAPON, 5, date(2025, 4, 1)).await;
    purchase(&store, ALPHA, 1, 2, date(2025, 5, 1)).await;
    purchase(&store, BETA, WEAPON, 9, date(2025, 6, 1)).await;
    transfer(&store, BETA, ALPHA, WEAPON, 3, date(2025, 6, 5)).await;
    transfer(&store, ALPHA, BETA, WEAPON, 1, date(2025, 6, 7)).await;
    assign(&store, ALPHA, WEAPON, 1, date(2025, 6, 8)).await;

    let weapons = store
        .list_purchases(ListFilter::parse(None, Some(WEAPON)).unwrap())
        .await
        .unwrap();
    let dates: Vec<_> = weapons.iter().map(|p| p.details.purchase_date).collect();
    assert_eq!(dates, vec![date(2025, 6, 1), date(2025, 4, 1)]);
    assert_eq!(weapons[0].base_name.as_deref(), Some("Beta Base"));

    let alpha_transfers = store
        .list_transfers(ListFilter::parse(Some(ALPHA), None).unwrap())
        .await
        .unwrap();
    let ids: Vec<i32> = alpha_transfers.iter().map(|t| t.transfer.transfer_id).collect();
    assert_eq!(ids, vec![2, 1]);

    let assignments = store
        .list_assignments(ListFilter::parse(Some(BETA), None).unwrap())
        .await
        .unwrap();
    assert!(assignments.is_empty());

    let json = serde_json::to_value(&alpha_transfers[0]).unwrap();
    assert_eq!(json["transfer_id"], 2);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["destination_base_name"], "Beta Base");
}
