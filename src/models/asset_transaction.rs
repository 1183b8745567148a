use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

use super::{Id, IdGenerator, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetOperation {
    Buy,
    Sell,
    Dividend,
    Fee,
    Transfer,
}

/// One operation against an asset. Many-to-one with [`super::Asset`].
///
/// Asset transactions carry no update timestamp; once recorded they are
/// identified by creation time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransaction {
    pub id: Id,
    pub asset_id: Id,
    #[serde(rename = "type")]
    pub operation: AssetOperation,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub currency: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssetTransaction {
    pub asset_id: Id,
    pub operation: AssetOperation,
    pub amount: Decimal,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl AssetTransaction {
    pub fn new_with_generator(
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
        data: NewAssetTransaction,
    ) -> Self {
        Self {
            id: ids.new_id(),
            asset_id: data.asset_id,
            operation: data.operation,
            amount: data.amount,
            quantity: data.quantity,
            price: data.price,
            currency: data.currency,
            date: data.date,
            notes: data.notes,
            created_at: clock.now(),
        }
    }
}

impl Keyed for AssetTransaction {
    fn id(&self) -> &Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetTransactionPatch {
    pub asset_id: Option<Id>,
    pub operation: Option<AssetOperation>,
    pub amount: Option<Decimal>,
    pub quantity: Option<Option<Decimal>>,
    pub price: Option<Option<Decimal>>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

impl AssetTransactionPatch {
    pub fn apply_to(self, txn: &mut AssetTransaction) {
        if let Some(v) = self.asset_id {
            txn.asset_id = v;
        }
        if let Some(v) = self.operation {
            txn.operation = v;
        }
        if let Some(v) = self.amount {
            txn.amount = v;
        }
        if let Some(v) = self.quantity {
            txn.quantity = v;
        }
        if let Some(v) = self.price {
            txn.price = v;
        }
        if let Some(v) = self.currency {
            txn.currency = v;
        }
        if let Some(v) = self.date {
            txn.date = v;
        }
        if let Some(v) = self.notes {
            txn.notes = v;
        }
    }
}
