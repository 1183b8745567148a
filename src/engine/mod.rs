//! The reconciliation and valuation engine.
//!
//! Owns the in-memory authoritative copy of the four entity lists. Mutations
//! apply synchronously; the full snapshot is then persisted to the local
//! store and the changed records pushed to the remote mirror as background
//! tasks, ordered per write target by a `WriteGate`. Callers see the
//! in-memory change immediately but must not assume durability at the moment
//! a mutation returns.

mod snapshot;
pub mod valuation;

pub use snapshot::{DataSnapshot, SnapshotError};

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Asset, AssetPatch, AssetTransaction, AssetTransactionPatch, BillPatch, Id, IdGenerator, Keyed,
    NewAsset, NewAssetTransaction, NewBill, NewTransaction, Portfolio, RecurringBill,
    SettingsPatch, Transaction, TransactionPatch, UserSettings, UuidIdGenerator,
};
use crate::remote::{Collection, RemoteMirror};
use crate::storage::LocalStore;

/// One remotely-loaded snapshot of the four collections, ready to merge.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub transactions: Vec<Transaction>,
    pub assets: Vec<Asset>,
    pub asset_transactions: Vec<AssetTransaction>,
    pub bills: Vec<RecurringBill>,
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Transactions,
    Assets,
    AssetTransactions,
    Bills,
}

/// Orders background writes of one durable object (a list file, or one
/// remote document).
///
/// Spawned tasks may finish in any order; the generation check keeps an
/// older snapshot from landing on top of a newer one, and the mutex keeps
/// two writes from interleaving. A failed write still claims its generation,
/// so nothing older can overwrite the state it left behind.
#[derive(Default)]
struct WriteGate {
    queued: AtomicU64,
    written: tokio::sync::Mutex<u64>,
}

impl WriteGate {
    /// Claim the next generation. Call synchronously at schedule time, in
    /// mutation order.
    fn next(&self) -> u64 {
        self.queued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `save` unless a newer generation already went through.
    async fn run<F, Fut>(&self, generation: u64, save: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut written = self.written.lock().await;
        if *written >= generation {
            return Ok(());
        }
        let result = save().await;
        *written = generation;
        result
    }
}

#[derive(Default)]
struct SaveGates {
    transactions: Arc<WriteGate>,
    assets: Arc<WriteGate>,
    asset_transactions: Arc<WriteGate>,
    bills: Arc<WriteGate>,
    settings: Arc<WriteGate>,
}

pub struct Engine {
    transactions: Vec<Transaction>,
    assets: Vec<Asset>,
    asset_transactions: Vec<AssetTransaction>,
    bills: Vec<RecurringBill>,
    portfolio: Portfolio,
    settings: UserSettings,
    store: Arc<dyn LocalStore>,
    mirror: Arc<dyn RemoteMirror>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    tasks: JoinSet<()>,
    save_gates: SaveGates,
    push_gates: HashMap<(Collection, Id), Arc<WriteGate>>,
}

impl Engine {
    pub fn new(store: Arc<dyn LocalStore>, mirror: Arc<dyn RemoteMirror>) -> Self {
        Self {
            transactions: Vec::new(),
            assets: Vec::new(),
            asset_transactions: Vec::new(),
            bills: Vec::new(),
            portfolio: Portfolio::default(),
            settings: UserSettings::default(),
            store,
            mirror,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdGenerator),
            tasks: JoinSet::new(),
            save_gates: SaveGates::default(),
            push_gates: HashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Load the persisted lists and settings from the local store.
    ///
    /// Must complete before any remote merge: remote data is merged on top
    /// of the local snapshot, never instead of it.
    pub async fn load(&mut self) -> Result<()> {
        self.transactions = self.store.load_transactions().await?;
        self.assets = self.store.load_assets().await?;
        self.asset_transactions = self.store.load_asset_transactions().await?;
        self.bills = self.store.load_bills().await?;
        self.settings = self.store.load_settings().await?.unwrap_or_default();
        self.recompute_portfolio();
        Ok(())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset_transactions(&self) -> &[AssetTransaction] {
        &self.asset_transactions
    }

    pub fn bills(&self) -> &[RecurringBill] {
        &self.bills
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    // --- Transactions ---

    pub fn add_transaction(&mut self, data: NewTransaction) -> Transaction {
        let txn = Transaction::new_with_generator(self.ids.as_ref(), self.clock.as_ref(), data);
        self.transactions.push(txn.clone());
        self.persist(ListKind::Transactions);
        self.push_upsert(Collection::Transactions, &txn.id, &txn);
        txn
    }

    /// Merge `patch` into the matching transaction. An unknown id leaves the
    /// list untouched.
    pub fn update_transaction(&mut self, id: &Id, patch: TransactionPatch) {
        let now = self.clock.now();
        let Some(txn) = self.transactions.iter_mut().find(|t| &t.id == id) else {
            trace!(%id, "update for unknown transaction id, ignoring");
            return;
        };
        patch.apply_to(txn);
        txn.updated_at = now;
        let record = txn.clone();
        self.persist(ListKind::Transactions);
        self.push_upsert(Collection::Transactions, &record.id, &record);
    }

    pub fn delete_transaction(&mut self, id: &Id) {
        if remove_by_id(&mut self.transactions, id) {
            self.persist(ListKind::Transactions);
        }
        self.push_delete(Collection::Transactions, id);
    }

    // --- Assets ---

    pub fn add_asset(&mut self, data: NewAsset) -> Asset {
        let asset = Asset::new_with_generator(self.ids.as_ref(), self.clock.as_ref(), data);
        self.assets.push(asset.clone());
        self.persist(ListKind::Assets);
        self.push_upsert(Collection::Assets, &asset.id, &asset);
        self.recompute_portfolio();
        asset
    }

    pub fn update_asset(&mut self, id: &Id, patch: AssetPatch) {
        let now = self.clock.now();
        let Some(asset) = self.assets.iter_mut().find(|a| &a.id == id) else {
            trace!(%id, "update for unknown asset id, ignoring");
            return;
        };
        patch.apply_to(asset);
        asset.updated_at = now;
        let record = asset.clone();
        self.persist(ListKind::Assets);
        self.push_upsert(Collection::Assets, &record.id, &record);
        self.recompute_portfolio();
    }

    pub fn delete_asset(&mut self, id: &Id) {
        if remove_by_id(&mut self.assets, id) {
            self.persist(ListKind::Assets);
            self.recompute_portfolio();
        }
        self.push_delete(Collection::Assets, id);
    }

    // --- Asset transactions ---

    pub fn add_asset_transaction(&mut self, data: NewAssetTransaction) -> AssetTransaction {
        let txn =
            AssetTransaction::new_with_generator(self.ids.as_ref(), self.clock.as_ref(), data);
        self.asset_transactions.push(txn.clone());
        self.persist(ListKind::AssetTransactions);
        self.push_upsert(Collection::AssetTransactions, &txn.id, &txn);
        self.revalue_assets();
        txn
    }

    pub fn update_asset_transaction(&mut self, id: &Id, patch: AssetTransactionPatch) {
        let Some(txn) = self.asset_transactions.iter_mut().find(|t| &t.id == id) else {
            trace!(%id, "update for unknown asset transaction id, ignoring");
            return;
        };
        patch.apply_to(txn);
        let record = txn.clone();
        self.persist(ListKind::AssetTransactions);
        self.push_upsert(Collection::AssetTransactions, &record.id, &record);
        self.revalue_assets();
    }

    pub fn delete_asset_transaction(&mut self, id: &Id) {
        if remove_by_id(&mut self.asset_transactions, id) {
            self.persist(ListKind::AssetTransactions);
            self.revalue_assets();
        }
        self.push_delete(Collection::AssetTransactions, id);
    }

    // --- Bills ---

    pub fn add_bill(&mut self, data: NewBill) -> RecurringBill {
        let bill = RecurringBill::new_with_generator(self.ids.as_ref(), self.clock.as_ref(), data);
        self.bills.push(bill.clone());
        self.persist(ListKind::Bills);
        self.push_upsert(Collection::Bills, &bill.id, &bill);
        bill
    }

    pub fn update_bill(&mut self, id: &Id, patch: BillPatch) {
        let now = self.clock.now();
        let Some(bill) = self.bills.iter_mut().find(|b| &b.id == id) else {
            trace!(%id, "update for unknown bill id, ignoring");
            return;
        };
        patch.apply_to(bill);
        bill.updated_at = now;
        let record = bill.clone();
        self.persist(ListKind::Bills);
        self.push_upsert(Collection::Bills, &record.id, &record);
    }

    pub fn delete_bill(&mut self, id: &Id) {
        if remove_by_id(&mut self.bills, id) {
            self.persist(ListKind::Bills);
        }
        self.push_delete(Collection::Bills, id);
    }

    // --- Settings ---

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        patch.apply_to(&mut self.settings);
        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        let gate = Arc::clone(&self.save_gates.settings);
        let generation = gate.next();
        self.tasks.spawn(async move {
            let outcome = gate
                .run(generation, move || async move {
                    store.save_settings(&settings).await
                })
                .await;
            if let Err(e) = outcome {
                warn!(error = %e, "failed to persist settings");
            }
        });
    }

    // --- Reconciliation ---

    /// Merge a remotely-loaded snapshot into the local lists.
    ///
    /// Per record: overwrite in place on id match (remote wins regardless of
    /// timestamps), append when absent locally. Local records with no remote
    /// counterpart are preserved. Upsert-by-id makes the merge idempotent.
    pub fn merge_remote_snapshot(&mut self, snapshot: RemoteSnapshot) {
        let txns_changed = merge_by_id(&mut self.transactions, snapshot.transactions);
        let assets_changed = merge_by_id(&mut self.assets, snapshot.assets);
        let asset_txns_changed =
            merge_by_id(&mut self.asset_transactions, snapshot.asset_transactions);
        let bills_changed = merge_by_id(&mut self.bills, snapshot.bills);

        if txns_changed {
            self.persist(ListKind::Transactions);
        }
        if asset_txns_changed {
            self.persist(ListKind::AssetTransactions);
        }
        if bills_changed {
            self.persist(ListKind::Bills);
        }

        // Revalue only when the transaction history actually changed;
        // merged-in asset records must not be clobbered by a fold over an
        // unchanged (possibly empty) history.
        let mut assets_dirty = assets_changed;
        if asset_txns_changed && !self.recompute_asset_values().is_empty() {
            assets_dirty = true;
        }
        if assets_dirty {
            self.persist(ListKind::Assets);
            self.recompute_portfolio();
        }
    }

    /// Load all four remote collections and merge them. Skipped entirely
    /// while offline; any remote failure is logged and swallowed. There is
    /// no automatic retry on regained connectivity; callers decide when to
    /// pull again.
    pub async fn pull_remote(&mut self) {
        if !self.mirror.is_online() {
            debug!("offline, skipping remote merge");
            return;
        }
        let snapshot = match self.fetch_remote_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "failed to load remote snapshot");
                return;
            }
        };
        self.merge_remote_snapshot(snapshot);
    }

    async fn fetch_remote_snapshot(&self) -> Result<RemoteSnapshot> {
        Ok(RemoteSnapshot {
            transactions: decode_records(
                Collection::Transactions,
                self.mirror.list_all(Collection::Transactions).await?,
            ),
            assets: decode_records(
                Collection::Assets,
                self.mirror.list_all(Collection::Assets).await?,
            ),
            asset_transactions: decode_records(
                Collection::AssetTransactions,
                self.mirror.list_all(Collection::AssetTransactions).await?,
            ),
            bills: decode_records(
                Collection::Bills,
                self.mirror.list_all(Collection::Bills).await?,
            ),
        })
    }

    // --- Valuation ---

    /// Rewrite every asset's cached `current_value` from the current
    /// transaction history. Returns the ids of assets whose value changed.
    pub fn recompute_asset_values(&mut self) -> Vec<Id> {
        let now = self.clock.now();
        let mut changed = Vec::new();
        let txns = &self.asset_transactions;
        for asset in &mut self.assets {
            let value = valuation::position(&asset.id, txns).value;
            if asset.current_value != value {
                asset.current_value = value;
                asset.updated_at = now;
                changed.push(asset.id.clone());
            }
        }
        changed
    }

    /// Rebuild the portfolio snapshot from the current asset list.
    pub fn recompute_portfolio(&mut self) {
        self.portfolio = valuation::portfolio_of(&self.assets);
    }

    /// The two-step pipeline run after every asset-transaction change:
    /// fold values, then rebuild the portfolio. Sequencing the steps here
    /// (instead of reacting to each other's writes) rules out recompute
    /// loops.
    fn revalue_assets(&mut self) {
        let changed = self.recompute_asset_values();
        if !changed.is_empty() {
            self.persist(ListKind::Assets);
            let records: Vec<Asset> = self
                .assets
                .iter()
                .filter(|a| changed.contains(&a.id))
                .cloned()
                .collect();
            for asset in records {
                self.push_upsert(Collection::Assets, &asset.id, &asset);
            }
        }
        self.recompute_portfolio();
    }

    // --- Export / import ---

    pub fn export_snapshot(&self) -> DataSnapshot {
        DataSnapshot {
            transactions: Some(self.transactions.clone()),
            assets: Some(self.assets.clone()),
            asset_transactions: Some(self.asset_transactions.clone()),
            bills: Some(self.bills.clone()),
            exported_at: Some(self.clock.now()),
        }
    }

    /// Replace lists from an exported payload. Parsing happens before any
    /// list is touched, so a malformed payload never partially imports.
    /// Keys absent from the payload leave their lists untouched.
    pub fn import_snapshot(&mut self, payload: &str) -> Result<(), SnapshotError> {
        let snapshot = DataSnapshot::parse(payload)?;

        let mut asset_txns_changed = false;
        let mut assets_dirty = false;

        if let Some(txns) = snapshot.transactions {
            if self.transactions != txns {
                self.transactions = txns;
                self.persist(ListKind::Transactions);
            }
        }
        if let Some(assets) = snapshot.assets {
            if self.assets != assets {
                self.assets = assets;
                assets_dirty = true;
            }
        }
        if let Some(txns) = snapshot.asset_transactions {
            if self.asset_transactions != txns {
                self.asset_transactions = txns;
                asset_txns_changed = true;
                self.persist(ListKind::AssetTransactions);
            }
        }
        if let Some(bills) = snapshot.bills {
            if self.bills != bills {
                self.bills = bills;
                self.persist(ListKind::Bills);
            }
        }

        if asset_txns_changed && !self.recompute_asset_values().is_empty() {
            assets_dirty = true;
        }
        if assets_dirty {
            self.persist(ListKind::Assets);
            self.recompute_portfolio();
        }
        Ok(())
    }

    // --- Background I/O ---

    /// Await all scheduled persistence and sync tasks. Mutations do not wait
    /// for durability; call this before shutdown (or in tests) to drain the
    /// queue.
    pub async fn flush(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "background task failed");
            }
        }
    }

    fn persist(&mut self, kind: ListKind) {
        let store = Arc::clone(&self.store);
        match kind {
            ListKind::Transactions => {
                let txns = self.transactions.clone();
                let gate = Arc::clone(&self.save_gates.transactions);
                let generation = gate.next();
                self.tasks.spawn(async move {
                    let outcome = gate
                        .run(generation, move || async move {
                            store.save_transactions(&txns).await
                        })
                        .await;
                    if let Err(e) = outcome {
                        warn!(error = %e, "failed to persist transactions");
                    }
                });
            }
            ListKind::Assets => {
                let assets = self.assets.clone();
                let gate = Arc::clone(&self.save_gates.assets);
                let generation = gate.next();
                self.tasks.spawn(async move {
                    let outcome = gate
                        .run(generation, move || async move {
                            store.save_assets(&assets).await
                        })
                        .await;
                    if let Err(e) = outcome {
                        warn!(error = %e, "failed to persist assets");
                    }
                });
            }
            ListKind::AssetTransactions => {
                let txns = self.asset_transactions.clone();
                let gate = Arc::clone(&self.save_gates.asset_transactions);
                let generation = gate.next();
                self.tasks.spawn(async move {
                    let outcome = gate
                        .run(generation, move || async move {
                            store.save_asset_transactions(&txns).await
                        })
                        .await;
                    if let Err(e) = outcome {
                        warn!(error = %e, "failed to persist asset transactions");
                    }
                });
            }
            ListKind::Bills => {
                let bills = self.bills.clone();
                let gate = Arc::clone(&self.save_gates.bills);
                let generation = gate.next();
                self.tasks.spawn(async move {
                    let outcome = gate
                        .run(generation, move || async move {
                            store.save_bills(&bills).await
                        })
                        .await;
                    if let Err(e) = outcome {
                        warn!(error = %e, "failed to persist bills");
                    }
                });
            }
        }
    }

    /// Gate shared by every push for one remote document, so upserts and
    /// deletes of the same record stay in mutation order.
    fn push_gate(&mut self, collection: Collection, id: &Id) -> Arc<WriteGate> {
        Arc::clone(
            self.push_gates
                .entry((collection, id.clone()))
                .or_default(),
        )
    }

    fn push_upsert<T: Serialize>(&mut self, collection: Collection, id: &Id, record: &T) {
        if !self.mirror.is_online() {
            trace!(%collection, %id, "offline, skipping remote push");
            return;
        }
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                warn!(%collection, %id, error = %e, "failed to serialize record for remote push");
                return;
            }
        };
        let mirror = Arc::clone(&self.mirror);
        let gate = self.push_gate(collection, id);
        let generation = gate.next();
        let id = id.clone();
        self.tasks.spawn(async move {
            let outcome = gate
                .run(generation, {
                    let id = id.clone();
                    move || async move { mirror.upsert(collection, &id, value).await }
                })
                .await;
            if let Err(e) = outcome {
                warn!(%collection, %id, error = %e, "remote upsert failed");
            }
        });
    }

    fn push_delete(&mut self, collection: Collection, id: &Id) {
        if !self.mirror.is_online() {
            trace!(%collection, %id, "offline, skipping remote delete");
            return;
        }
        let mirror = Arc::clone(&self.mirror);
        let gate = self.push_gate(collection, id);
        let generation = gate.next();
        let id = id.clone();
        self.tasks.spawn(async move {
            let outcome = gate
                .run(generation, {
                    let id = id.clone();
                    move || async move { mirror.delete(collection, &id).await }
                })
                .await;
            if let Err(e) = outcome {
                warn!(%collection, %id, error = %e, "remote delete failed");
            }
        });
    }
}

/// Upsert-by-id merge. Returns whether the list changed by value.
fn merge_by_id<T: Keyed + PartialEq>(local: &mut Vec<T>, remote: Vec<T>) -> bool {
    let mut changed = false;
    for record in remote {
        match local.iter_mut().find(|e| e.id() == record.id()) {
            Some(existing) => {
                if *existing != record {
                    *existing = record;
                    changed = true;
                }
            }
            None => {
                local.push(record);
                changed = true;
            }
        }
    }
    changed
}

fn remove_by_id<T: Keyed>(list: &mut Vec<T>, id: &Id) -> bool {
    let before = list.len();
    list.retain(|e| e.id() != id);
    list.len() != before
}

fn decode_records<T: DeserializeOwned>(collection: Collection, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%collection, error = %e, "skipping malformed remote record");
                None
            }
        })
        .collect()
}
