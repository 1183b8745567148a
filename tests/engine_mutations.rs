mod support;

use finanzas::models::{AssetKind, AssetOperation, BillPatch, Id, TransactionPatch};
use finanzas::remote::Collection;
use finanzas::storage::LocalStore;
use rust_decimal_macros::dec;
use support::{harness, new_bill, new_expense, offline_harness, operation};

#[tokio::test]
async fn add_transaction_persists_and_pushes() {
    let mut h = harness();

    let txn = h.engine.add_transaction(new_expense(dec!(50)));
    h.engine.flush().await;

    let stored = h.store.load_transactions().await.unwrap();
    assert_eq!(stored, vec![txn.clone()]);

    let pushed = h.mirror.records(Collection::Transactions);
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[txn.id.as_str()]["amount"], 50.0);
}

#[tokio::test]
async fn update_refreshes_timestamp_fields_from_patch() {
    let mut h = harness();
    let txn = h.engine.add_transaction(new_expense(dec!(50)));

    h.clock.advance(chrono::Duration::minutes(5));
    h.engine.update_transaction(
        &txn.id,
        TransactionPatch {
            amount: Some(dec!(75)),
            category: Some("Transport".to_string()),
            ..Default::default()
        },
    );
    h.engine.flush().await;

    let updated = &h.engine.transactions()[0];
    assert_eq!(updated.amount, dec!(75));
    assert_eq!(updated.category, "Transport");
    assert_eq!(updated.description, "groceries");
    assert_eq!(updated.created_at, txn.created_at);
    assert!(updated.updated_at > updated.created_at);

    let pushed = h.mirror.records(Collection::Transactions);
    assert_eq!(pushed[txn.id.as_str()]["amount"], 75.0);
}

#[tokio::test]
async fn update_with_unknown_id_is_a_silent_noop() {
    let mut h = harness();
    let txn = h.engine.add_transaction(new_expense(dec!(50)));

    h.engine.update_transaction(
        &Id::from_string("no-such-id"),
        TransactionPatch {
            amount: Some(dec!(999)),
            ..Default::default()
        },
    );
    h.engine.flush().await;

    assert_eq!(h.engine.transactions(), &[txn]);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let mut h = harness();
    let txn = h.engine.add_transaction(new_expense(dec!(50)));
    h.engine.flush().await;

    h.engine.delete_transaction(&txn.id);
    h.engine.delete_transaction(&txn.id);
    h.engine.flush().await;

    assert!(h.engine.transactions().is_empty());
    assert!(h.store.load_transactions().await.unwrap().is_empty());
    assert!(h.mirror.records(Collection::Transactions).is_empty());
}

#[tokio::test]
async fn asset_transaction_mutations_revalue_the_asset() {
    let mut h = harness();
    let asset = h.engine.add_asset(support::new_asset("VWCE", AssetKind::Etf));

    let buy = h
        .engine
        .add_asset_transaction(operation(&asset.id, AssetOperation::Buy, dec!(100)));
    h.engine
        .add_asset_transaction(operation(&asset.id, AssetOperation::Fee, dec!(5)));
    h.engine.flush().await;

    assert_eq!(h.engine.assets()[0].current_value, dec!(95));
    assert_eq!(h.engine.portfolio().total_value, dec!(95));

    // The revalued asset record is mirrored, not just the operation.
    let pushed = h.mirror.records(Collection::Assets);
    assert_eq!(pushed[asset.id.as_str()]["currentValue"], 95.0);

    h.engine.delete_asset_transaction(&buy.id);
    h.engine.flush().await;

    // Fee alone would fold below zero; the position is clamped.
    assert_eq!(h.engine.assets()[0].current_value, dec!(0));
    assert_eq!(h.engine.portfolio().total_value, dec!(0));
}

#[tokio::test]
async fn bill_lifecycle_round_trips_through_the_store() {
    let mut h = harness();
    let bill = h.engine.add_bill(new_bill("Internet"));

    h.engine.update_bill(
        &bill.id,
        BillPatch {
            is_active: Some(false),
            next_due_date: Some(None),
            ..Default::default()
        },
    );
    h.engine.flush().await;

    let stored = h.store.load_bills().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].is_active);
    assert_eq!(stored[0].next_due_date, None);

    h.engine.delete_bill(&bill.id);
    h.engine.flush().await;
    assert!(h.store.load_bills().await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_mutations_persist_locally_without_pushing() {
    let mut h = offline_harness();

    let txn = h.engine.add_transaction(new_expense(dec!(50)));
    h.engine.delete_transaction(&txn.id);
    let kept = h.engine.add_transaction(new_expense(dec!(20)));
    h.engine.flush().await;

    assert_eq!(h.store.load_transactions().await.unwrap(), vec![kept]);
    assert!(h.mirror.records(Collection::Transactions).is_empty());
}

#[tokio::test]
async fn remote_write_failures_are_swallowed() {
    let mut h = harness();
    h.mirror.set_fail_writes(true);

    let txn = h.engine.add_transaction(new_expense(dec!(50)));
    h.engine.delete_transaction(&txn.id);
    let kept = h.engine.add_transaction(new_expense(dec!(20)));
    h.engine.flush().await;

    // Local state is authoritative; the failed pushes change nothing.
    assert_eq!(h.engine.transactions(), &[kept.clone()]);
    assert_eq!(h.store.load_transactions().await.unwrap(), vec![kept]);
    assert!(h.mirror.records(Collection::Transactions).is_empty());
}

#[tokio::test]
async fn seeded_id_generator_makes_records_deterministic() {
    let mut h = harness();
    h.engine = h
        .engine
        .with_id_generator(std::sync::Arc::new(finanzas::models::FixedIdGenerator::new([
            Id::from_string("txn-1"),
        ])));

    let txn = h.engine.add_transaction(new_expense(dec!(50)));
    h.engine.flush().await;

    assert_eq!(txn.id.as_str(), "txn-1");
    assert!(h.mirror.records(Collection::Transactions).contains_key("txn-1"));
}

#[tokio::test]
async fn settings_updates_persist_but_never_hit_the_mirror() {
    let mut h = harness();
    assert_eq!(h.engine.settings().default_currency, "EUR");

    h.engine.update_settings(finanzas::models::SettingsPatch {
        default_currency: Some("USD".to_string()),
        user_name: Some("Ana".to_string()),
        ..Default::default()
    });
    h.engine.flush().await;

    assert_eq!(h.engine.settings().default_currency, "USD");
    let stored = h.store.load_settings().await.unwrap().unwrap();
    assert_eq!(stored.user_name, "Ana");

    for collection in [
        Collection::Transactions,
        Collection::Assets,
        Collection::AssetTransactions,
        Collection::Bills,
    ] {
        assert!(h.mirror.records(collection).is_empty());
    }
}

#[tokio::test]
async fn load_restores_lists_and_recomputes_portfolio() {
    let mut h = harness();
    let asset = h.engine.add_asset(support::new_asset("VWCE", AssetKind::Etf));
    h.engine
        .add_asset_transaction(operation(&asset.id, AssetOperation::Buy, dec!(100)));
    h.engine.flush().await;

    let mut reloaded = finanzas::engine::Engine::new(h.store.clone(), h.mirror.clone());
    reloaded.load().await.unwrap();

    assert_eq!(reloaded.assets(), h.engine.assets());
    assert_eq!(reloaded.portfolio().total_value, dec!(100));
}
