//! Background writes are spawned per mutation and may finish out of order.
//! These tests stall the first write of a backend and check that the state
//! left on disk (or on the mirror) is still the latest one.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rust_decimal_macros::dec;
use serde_json::Value;

use finanzas::clock::FixedClock;
use finanzas::engine::Engine;
use finanzas::models::{
    Asset, AssetTransaction, Id, RecurringBill, Transaction, UserSettings,
};
use finanzas::remote::{Collection, MemoryMirror, RemoteMirror};
use finanzas::storage::{LocalStore, MemoryStore};

use support::{fixed_now, new_expense};

/// Store whose first transaction save sleeps, so a later save can finish
/// before it.
struct StallingStore {
    inner: MemoryStore,
    stalled: AtomicBool,
}

impl StallingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl LocalStore for StallingStore {
    async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        self.inner.load_transactions().await
    }

    async fn save_transactions(&self, txns: &[Transaction]) -> Result<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.inner.save_transactions(txns).await
    }

    async fn load_assets(&self) -> Result<Vec<Asset>> {
        self.inner.load_assets().await
    }

    async fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        self.inner.save_assets(assets).await
    }

    async fn load_asset_transactions(&self) -> Result<Vec<AssetTransaction>> {
        self.inner.load_asset_transactions().await
    }

    async fn save_asset_transactions(&self, txns: &[AssetTransaction]) -> Result<()> {
        self.inner.save_asset_transactions(txns).await
    }

    async fn load_bills(&self) -> Result<Vec<RecurringBill>> {
        self.inner.load_bills().await
    }

    async fn save_bills(&self, bills: &[RecurringBill]) -> Result<()> {
        self.inner.save_bills(bills).await
    }

    async fn load_settings(&self) -> Result<Option<UserSettings>> {
        self.inner.load_settings().await
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        self.inner.save_settings(settings).await
    }
}

/// Mirror whose first upsert sleeps, so a delete issued afterwards can land
/// first.
struct StallingMirror {
    inner: MemoryMirror,
    stalled: AtomicBool,
}

impl StallingMirror {
    fn new() -> Self {
        Self {
            inner: MemoryMirror::new(),
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl RemoteMirror for StallingMirror {
    fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    async fn upsert(&self, collection: Collection, id: &Id, record: Value) -> Result<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.inner.upsert(collection, id, record).await
    }

    async fn delete(&self, collection: Collection, id: &Id) -> Result<()> {
        self.inner.delete(collection, id).await
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        self.inner.list_all(collection).await
    }
}

#[tokio::test]
async fn a_stalled_earlier_save_cannot_overwrite_a_newer_one() {
    let store = Arc::new(StallingStore::new());
    let mirror = Arc::new(MemoryMirror::offline());
    let mut engine = Engine::new(store.clone(), mirror)
        .with_clock(Arc::new(FixedClock::new(fixed_now())));

    engine.add_transaction(new_expense(dec!(1)));
    engine.add_transaction(new_expense(dec!(2)));
    engine.flush().await;

    let on_disk = store.inner.load_transactions().await.unwrap();
    assert_eq!(on_disk.len(), 2);
    assert_eq!(on_disk, engine.transactions());
}

#[tokio::test]
async fn a_stalled_upsert_cannot_resurrect_a_deleted_record() {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(StallingMirror::new());
    let mut engine = Engine::new(store, mirror.clone())
        .with_clock(Arc::new(FixedClock::new(fixed_now())));

    let added = engine.add_transaction(new_expense(dec!(3)));
    let id = added.id.clone();
    engine.delete_transaction(&id);
    engine.flush().await;

    assert!(mirror.inner.records(Collection::Transactions).is_empty());
}
