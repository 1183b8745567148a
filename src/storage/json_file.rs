use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

use crate::models::{Asset, AssetTransaction, RecurringBill, Transaction, UserSettings};

use super::LocalStore;

/// JSON file-based store.
///
/// Directory structure:
/// ```text
/// data/
///   transactions.json
///   assets.json
///   asset-transactions.json
///   bills.json
///   settings.json
/// ```
///
/// Each list file holds one JSON array. A missing file reads as an empty
/// list; entries that fail to deserialize are skipped with a warning so one
/// bad record cannot take the whole data set offline.
pub struct JsonFileStore {
    base_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn transactions_file(&self) -> PathBuf {
        self.base_path.join("transactions.json")
    }

    fn assets_file(&self) -> PathBuf {
        self.base_path.join("assets.json")
    }

    fn asset_transactions_file(&self) -> PathBuf {
        self.base_path.join("asset-transactions.json")
    }

    fn bills_file(&self) -> PathBuf {
        self.base_path.join("bills.json")
    }

    fn settings_file(&self) -> PathBuf {
        self.base_path.join("settings.json")
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_list<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Vec<T>> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to read file"),
        };

        let raw: Vec<serde_json::Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON list from {:?}", path))?;

        let mut items = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value(value) {
                Ok(item) => items.push(item),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid entry"),
            }
        }
        Ok(items)
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, content)
            .await
            .context("Failed to write file")?;
        Ok(())
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &Path,
    ) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file"),
        }
    }
}

#[async_trait::async_trait]
impl LocalStore for JsonFileStore {
    async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        self.read_list(&self.transactions_file()).await
    }

    async fn save_transactions(&self, txns: &[Transaction]) -> Result<()> {
        self.write_json(&self.transactions_file(), &txns).await
    }

    async fn load_assets(&self) -> Result<Vec<Asset>> {
        self.read_list(&self.assets_file()).await
    }

    async fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        self.write_json(&self.assets_file(), &assets).await
    }

    async fn load_asset_transactions(&self) -> Result<Vec<AssetTransaction>> {
        self.read_list(&self.asset_transactions_file()).await
    }

    async fn save_asset_transactions(&self, txns: &[AssetTransaction]) -> Result<()> {
        self.write_json(&self.asset_transactions_file(), &txns).await
    }

    async fn load_bills(&self) -> Result<Vec<RecurringBill>> {
        self.read_list(&self.bills_file()).await
    }

    async fn save_bills(&self, bills: &[RecurringBill]) -> Result<()> {
        self.write_json(&self.bills_file(), &bills).await
    }

    async fn load_settings(&self) -> Result<Option<UserSettings>> {
        self.read_json(&self.settings_file()).await
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        self.write_json(&self.settings_file(), settings).await
    }
}
