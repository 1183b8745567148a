mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use anyhow::Result;

use crate::models::{Asset, AssetTransaction, RecurringBill, Transaction, UserSettings};

/// Local persistence for the four entity lists and the settings record.
///
/// Each save replaces the stored list wholesale; the engine owns the
/// in-memory authoritative copy and writes the full snapshot after every
/// mutation.
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    async fn load_transactions(&self) -> Result<Vec<Transaction>>;
    async fn save_transactions(&self, txns: &[Transaction]) -> Result<()>;

    async fn load_assets(&self) -> Result<Vec<Asset>>;
    async fn save_assets(&self, assets: &[Asset]) -> Result<()>;

    async fn load_asset_transactions(&self) -> Result<Vec<AssetTransaction>>;
    async fn save_asset_transactions(&self, txns: &[AssetTransaction]) -> Result<()>;

    async fn load_bills(&self) -> Result<Vec<RecurringBill>>;
    async fn save_bills(&self, bills: &[RecurringBill]) -> Result<()>;

    async fn load_settings(&self) -> Result<Option<UserSettings>>;
    async fn save_settings(&self, settings: &UserSettings) -> Result<()>;
}
