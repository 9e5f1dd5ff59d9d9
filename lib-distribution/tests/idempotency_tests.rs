//! Delivery De-duplication Tests
//!
//! A provider event id must never pay out twice, whether the redelivery
//! arrives after the first run finished or while it is still running.

use std::sync::Arc;
use std::time::Duration;

use lib_distribution::testing::{InMemoryLedger, InMemoryMint};
use lib_distribution::*;

fn registry() -> DestinationRegistry {
    let settlement = format!("0x{:040x}", 1);
    let fees = format!("0x{:040x}", 2);
    DestinationRegistry::from_pairs([
        ("settlementReserve", settlement.as_str()),
        ("h4hNonprofit", fees.as_str()),
        ("h4hTreasuryReserve", fees.as_str()),
        ("h4hCommunityPrograms", fees.as_str()),
        ("development", fees.as_str()),
        ("h4hGovernance", fees.as_str()),
    ])
    .unwrap()
}

fn distributor(schedule: FeeSchedule) -> (Arc<InMemoryLedger>, Arc<InMemoryEventStore>, IdempotentDistributor) {
    let ledger = Arc::new(InMemoryLedger::with_balance("1000".parse().unwrap()));
    let executor = DistributionExecutor::new(
        schedule,
        registry(),
        ledger.clone(),
        Arc::new(InMemoryMint::new()),
        ExecutorConfig::default(),
    );
    let store = Arc::new(InMemoryEventStore::new());
    let distributor = IdempotentDistributor::new(Arc::new(executor), store.clone());
    (ledger, store, distributor)
}

fn charge(id: &str) -> PaymentConfirmation {
    PaymentConfirmation::new("1.40".parse().unwrap(), "payer@example.com").with_event_id(id)
}

#[tokio::test]
async fn test_redelivery_returns_recorded_result() {
    let (ledger, _store, distributor) = distributor(FeeSchedule::standard());

    let first = distributor.deliver(&charge("ch_3Rj7v7")).await.unwrap();
    let second = distributor.deliver(&charge("ch_3Rj7v7")).await.unwrap();

    assert!(matches!(first, Delivery::Executed(_)));
    assert!(matches!(second, Delivery::Duplicate(_)));
    assert_eq!(first.result(), second.result());
    assert_eq!(ledger.transfer_attempts(), 7);
}

#[tokio::test]
async fn test_distinct_events_both_run() {
    let (ledger, store, distributor) = distributor(FeeSchedule::standard());

    distributor.deliver(&charge("ch_a")).await.unwrap();
    distributor.deliver(&charge("ch_b")).await.unwrap();

    assert_eq!(ledger.transfer_attempts(), 14);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_overlapping_delivery_reports_in_flight() {
    let (ledger, _store, distributor) = distributor(FeeSchedule::standard());
    ledger.set_delay(Duration::from_millis(5));

    let payment = charge("ch_dup");
    let (a, b) = tokio::join!(distributor.deliver(&payment), distributor.deliver(&payment));

    assert!(matches!(a.unwrap(), Delivery::Executed(_)));
    assert_eq!(b.unwrap(), Delivery::InFlight);
    assert_eq!(ledger.transfer_attempts(), 7);
}

#[tokio::test]
async fn test_fatal_error_releases_claim() {
    let mut schedule = FeeSchedule::standard();
    schedule.reinforcement_fee_bps = 9_900;
    let (ledger, store, distributor) = distributor(schedule);

    let err = distributor.deliver(&charge("ch_bad")).await.unwrap_err();

    assert!(matches!(
        err,
        DeliveryError::Distribution(DistributionError::Reconciliation(_))
    ));
    assert!(store.is_empty().await);
    assert_eq!(ledger.transfer_attempts(), 0);
}

#[tokio::test]
async fn test_missing_event_id_runs_every_time() {
    let (ledger, store, distributor) = distributor(FeeSchedule::standard());
    let payment = PaymentConfirmation::new("2".parse().unwrap(), "payer@example.com");

    distributor.deliver(&payment).await.unwrap();
    distributor.deliver(&payment).await.unwrap();

    assert_eq!(ledger.transfer_attempts(), 14);
    assert!(store.is_empty().await);
}
