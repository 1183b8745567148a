//! Natural-language extraction of financial records.
//!
//! An [`Extractor`] turns free-form text like "spent 50 euros on groceries"
//! into structured drafts. Drafts are plain data; persisting them goes
//! through the engine like any other mutation.

mod openai;

pub use openai::OpenAiExtractor;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    AssetKind, AssetOperation, NewTransaction, RecurringInterval, TransactionKind,
};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("OpenAI API key is missing or invalid. Set it in the configuration file.")]
    InvalidApiKey,
    #[error("extraction service rate limit exceeded, try again later")]
    RateLimited,
    #[error("could not reach the extraction service")]
    Network(#[source] reqwest::Error),
    #[error("extraction service returned an unparseable response")]
    MalformedResponse,
    #[error("extracted amount must be greater than zero")]
    InvalidAmount,
}

/// A transaction draft extracted from free-form text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
}

impl ExtractedTransaction {
    /// Fill in the fields the model does not produce: the draft carries no
    /// currency or booking date of its own.
    pub fn into_new_transaction(self, currency: &str, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            amount: self.amount,
            currency: currency.to_string(),
            category: self.category,
            description: self.description,
            date,
            is_recurring: self.is_recurring,
            recurring_interval: self.recurring_interval,
        }
    }
}

/// An asset operation draft extracted from free-form text. The asset is
/// identified by name only; resolving it to an id happens against the
/// caller's asset list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAssetTransaction {
    pub asset_name: String,
    pub asset_kind: AssetKind,
    #[serde(rename = "type")]
    pub operation: AssetOperation,
    pub amount: Decimal,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_transaction(&self, text: &str)
        -> Result<ExtractedTransaction, ExtractionError>;

    async fn extract_asset_transaction(
        &self,
        text: &str,
    ) -> Result<ExtractedAssetTransaction, ExtractionError>;
}
