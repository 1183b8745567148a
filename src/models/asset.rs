use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

use super::{Id, IdGenerator, Keyed};

/// Asset categories. `Etf` covers fund wrappers traded like equities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Equity,
    Etf,
    Fund,
    Crypto,
    Cash,
    Bond,
    Commodity,
    Forex,
    RealEstate,
}

/// An investment asset.
///
/// `current_value` is a derived cache: it is always recomputable from the
/// asset's transaction history and is rewritten by the engine whenever that
/// history changes. It must never be treated as an independent source of
/// truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub currency: String,
    pub current_value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_allocation: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub kind: AssetKind,
    pub symbol: Option<String>,
    pub currency: String,
    pub current_value: Decimal,
    pub target_allocation: Option<Decimal>,
    pub notes: Option<String>,
}

impl Asset {
    pub fn new_with_generator(ids: &dyn IdGenerator, clock: &dyn Clock, data: NewAsset) -> Self {
        let now = clock.now();
        Self {
            id: ids.new_id(),
            name: data.name,
            kind: data.kind,
            symbol: data.symbol,
            currency: data.currency,
            current_value: data.current_value,
            target_allocation: data.target_allocation,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Keyed for Asset {
    fn id(&self) -> &Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub kind: Option<AssetKind>,
    pub symbol: Option<Option<String>>,
    pub currency: Option<String>,
    pub current_value: Option<Decimal>,
    pub target_allocation: Option<Option<Decimal>>,
    pub notes: Option<Option<String>>,
}

impl AssetPatch {
    pub fn apply_to(self, asset: &mut Asset) {
        if let Some(v) = self.name {
            asset.name = v;
        }
        if let Some(v) = self.kind {
            asset.kind = v;
        }
        if let Some(v) = self.symbol {
            asset.symbol = v;
        }
        if let Some(v) = self.currency {
            asset.currency = v;
        }
        if let Some(v) = self.current_value {
            asset.current_value = v;
        }
        if let Some(v) = self.target_allocation {
            asset.target_allocation = v;
        }
        if let Some(v) = self.notes {
            asset.notes = v;
        }
    }
}
