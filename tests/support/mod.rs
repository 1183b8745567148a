#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use finanzas::clock::FixedClock;
use finanzas::engine::Engine;
use finanzas::models::{
    AssetKind, AssetOperation, Cadence, Id, NewAsset, NewAssetTransaction, NewBill,
    NewTransaction, TransactionKind,
};
use finanzas::remote::MemoryMirror;
use finanzas::storage::MemoryStore;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

/// An engine over in-memory store and mirror, with handles to both so tests
/// can inspect what was persisted and pushed.
pub struct Harness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub mirror: Arc<MemoryMirror>,
    pub clock: Arc<FixedClock>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(MemoryMirror::new());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let engine = Engine::new(store.clone(), mirror.clone()).with_clock(clock.clone());
    Harness {
        engine,
        store,
        mirror,
        clock,
    }
}

pub fn offline_harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(MemoryMirror::offline());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let engine = Engine::new(store.clone(), mirror.clone()).with_clock(clock.clone());
    Harness {
        engine,
        store,
        mirror,
        clock,
    }
}

pub fn new_expense(amount: Decimal) -> NewTransaction {
    NewTransaction {
        kind: TransactionKind::Expense,
        amount,
        currency: "EUR".to_string(),
        category: "Food".to_string(),
        description: "groceries".to_string(),
        date: fixed_date(),
        is_recurring: false,
        recurring_interval: None,
    }
}

pub fn new_asset(name: &str, kind: AssetKind) -> NewAsset {
    NewAsset {
        name: name.to_string(),
        kind,
        symbol: None,
        currency: "EUR".to_string(),
        current_value: Decimal::ZERO,
        target_allocation: None,
        notes: None,
    }
}

pub fn operation(
    asset_id: &Id,
    op: AssetOperation,
    amount: Decimal,
) -> NewAssetTransaction {
    NewAssetTransaction {
        asset_id: asset_id.clone(),
        operation: op,
        amount,
        quantity: None,
        price: None,
        currency: "EUR".to_string(),
        date: fixed_date(),
        notes: None,
    }
}

pub fn new_bill(name: &str) -> NewBill {
    NewBill {
        name: name.to_string(),
        amount: dec!(40),
        currency: "EUR".to_string(),
        category: "Services".to_string(),
        cadence: Cadence::Monthly,
        next_due_date: NaiveDate::from_ymd_opt(2026, 4, 1),
        account: "Main Account".to_string(),
        merchant: "ISP".to_string(),
        notes: None,
        is_active: true,
    }
}
