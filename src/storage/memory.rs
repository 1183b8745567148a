//! In-memory store implementation for testing.

use std::sync::Mutex;

use anyhow::Result;

use crate::models::{Asset, AssetTransaction, RecurringBill, Transaction, UserSettings};

use super::LocalStore;

/// In-memory store for testing purposes.
#[derive(Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    assets: Mutex<Vec<Asset>>,
    asset_transactions: Mutex<Vec<AssetTransaction>>,
    bills: Mutex<Vec<RecurringBill>>,
    settings: Mutex<Option<UserSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LocalStore for MemoryStore {
    async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().expect("lock poisoned").clone())
    }

    async fn save_transactions(&self, txns: &[Transaction]) -> Result<()> {
        *self.transactions.lock().expect("lock poisoned") = txns.to_vec();
        Ok(())
    }

    async fn load_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.lock().expect("lock poisoned").clone())
    }

    async fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        *self.assets.lock().expect("lock poisoned") = assets.to_vec();
        Ok(())
    }

    async fn load_asset_transactions(&self) -> Result<Vec<AssetTransaction>> {
        Ok(self
            .asset_transactions
            .lock()
            .expect("lock poisoned")
            .clone())
    }

    async fn save_asset_transactions(&self, txns: &[AssetTransaction]) -> Result<()> {
        *self.asset_transactions.lock().expect("lock poisoned") = txns.to_vec();
        Ok(())
    }

    async fn load_bills(&self) -> Result<Vec<RecurringBill>> {
        Ok(self.bills.lock().expect("lock poisoned").clone())
    }

    async fn save_bills(&self, bills: &[RecurringBill]) -> Result<()> {
        *self.bills.lock().expect("lock poisoned") = bills.to_vec();
        Ok(())
    }

    async fn load_settings(&self) -> Result<Option<UserSettings>> {
        Ok(self.settings.lock().expect("lock poisoned").clone())
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        *self.settings.lock().expect("lock poisoned") = Some(settings.clone());
        Ok(())
    }
}
