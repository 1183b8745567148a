use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Asset, AssetKind};

/// Derived snapshot over the asset list. Never persisted; the engine
/// recomputes it whenever the asset list changes.
///
/// `total_pnl` and `total_pnl_percentage` are always zero: no cost basis is
/// tracked across buy/sell lots, so there is nothing to compute them from.
/// This is a known functional gap, not a rounding artifact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub total_value: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_percentage: Decimal,
    pub assets: Vec<Asset>,
    /// Percentage of total value per asset kind. Empty when the total is
    /// zero.
    pub allocation: HashMap<AssetKind, Decimal>,
}
