use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Asset, AssetTransaction, RecurringBill, Transaction};

/// A full or partial export of the four entity lists.
///
/// On import, only the keys present in the payload replace their
/// corresponding list; absent keys leave the list untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Asset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_transactions: Option<Vec<AssetTransaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bills: Option<Vec<RecurringBill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The payload is not parseable structured data. Raised before any list
    /// is replaced, so a failed import never partially mutates state.
    #[error("invalid data format: {0}")]
    DataFormat(#[from] serde_json::Error),
}

impl DataSnapshot {
    pub fn parse(payload: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
