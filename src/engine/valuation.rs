//! The valuation fold: an asset's current value as a pure function of its
//! transaction history, plus the portfolio reduction over the asset list.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Asset, AssetOperation, AssetTransaction, Id, Portfolio};

/// Net value and quantity of one asset, folded from its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Net value, clamped at zero. Negative net value is not representable.
    pub value: Decimal,
    /// Running quantity across buys and sells; unset quantities count as
    /// zero.
    pub quantity: Decimal,
}

/// Fold an asset's transactions, in stored order, into its position.
///
/// The operators commute, so ordering among the asset's own transactions
/// does not affect the result.
pub fn position(asset_id: &Id, txns: &[AssetTransaction]) -> Position {
    let mut value = Decimal::ZERO;
    let mut quantity = Decimal::ZERO;

    for txn in txns.iter().filter(|t| &t.asset_id == asset_id) {
        match txn.operation {
            AssetOperation::Buy => {
                value += txn.amount;
                quantity += txn.quantity.unwrap_or_default();
            }
            AssetOperation::Sell => {
                value -= txn.amount;
                quantity -= txn.quantity.unwrap_or_default();
            }
            AssetOperation::Dividend => value += txn.amount,
            AssetOperation::Fee => value -= txn.amount,
            // Transfers move holdings without affecting value or quantity.
            AssetOperation::Transfer => {}
        }
    }

    Position {
        value: value.max(Decimal::ZERO),
        quantity,
    }
}

/// Reduce the asset list into the portfolio snapshot.
///
/// Allocation percentages are computed per asset kind and only when the
/// total is positive; a zero-value portfolio has an empty allocation map.
pub fn portfolio_of(assets: &[Asset]) -> Portfolio {
    let total: Decimal = assets.iter().map(|a| a.current_value).sum();

    let mut allocation: HashMap<_, Decimal> = HashMap::new();
    if total > Decimal::ZERO {
        for asset in assets {
            let share = asset.current_value / total * Decimal::ONE_HUNDRED;
            *allocation.entry(asset.kind).or_default() += share;
        }
    }

    Portfolio {
        total_value: total,
        total_pnl: Decimal::ZERO,
        total_pnl_percentage: Decimal::ZERO,
        assets: assets.to_vec(),
        allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::models::AssetKind;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn fixed_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
    }

    fn txn(asset_id: &str, operation: AssetOperation, amount: Decimal) -> AssetTransaction {
        AssetTransaction {
            id: Id::new(),
            asset_id: Id::from_string(asset_id),
            operation,
            amount,
            quantity: None,
            price: None,
            currency: "EUR".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            notes: None,
            created_at: fixed_clock().now(),
        }
    }

    fn asset(id: &str, kind: AssetKind, value: Decimal) -> Asset {
        let now = fixed_clock().now();
        Asset {
            id: Id::from_string(id),
            name: id.to_string(),
            kind,
            symbol: None,
            currency: "EUR".to_string(),
            current_value: value,
            target_allocation: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fold_applies_each_operation() {
        let txns = vec![
            txn("a", AssetOperation::Buy, dec!(100)),
            txn("a", AssetOperation::Dividend, dec!(10)),
            txn("a", AssetOperation::Fee, dec!(5)),
            txn("a", AssetOperation::Sell, dec!(50)),
        ];

        let pos = position(&Id::from_string("a"), &txns);
        assert_eq!(pos.value, dec!(55));
    }

    #[test]
    fn negative_net_value_clamps_to_zero() {
        let txns = vec![
            txn("a", AssetOperation::Buy, dec!(10)),
            txn("a", AssetOperation::Sell, dec!(50)),
        ];

        assert_eq!(position(&Id::from_string("a"), &txns).value, Decimal::ZERO);
    }

    #[test]
    fn transfers_and_other_assets_are_ignored() {
        let txns = vec![
            txn("a", AssetOperation::Buy, dec!(100)),
            txn("a", AssetOperation::Transfer, dec!(999)),
            txn("b", AssetOperation::Buy, dec!(777)),
        ];

        assert_eq!(position(&Id::from_string("a"), &txns).value, dec!(100));
    }

    #[test]
    fn fold_tracks_quantity_when_present() {
        let mut buy = txn("a", AssetOperation::Buy, dec!(1500));
        buy.quantity = Some(dec!(10));
        let mut sell = txn("a", AssetOperation::Sell, dec!(300));
        sell.quantity = Some(dec!(2));

        let pos = position(&Id::from_string("a"), &[buy, sell]);
        assert_eq!(pos.value, dec!(1200));
        assert_eq!(pos.quantity, dec!(8));
    }

    #[test]
    fn portfolio_totals_and_allocation_sum_to_one_hundred() {
        let assets = vec![
            asset("a", AssetKind::Equity, dec!(100)),
            asset("b", AssetKind::Crypto, dec!(250)),
            asset("c", AssetKind::Cash, dec!(0)),
        ];

        let portfolio = portfolio_of(&assets);
        assert_eq!(portfolio.total_value, dec!(350));
        assert_eq!(portfolio.total_pnl, Decimal::ZERO);

        let sum: Decimal = portfolio.allocation.values().copied().sum();
        assert!((sum - Decimal::ONE_HUNDRED).abs() < dec!(0.0001));
    }

    #[test]
    fn zero_total_yields_empty_allocation() {
        let assets = vec![asset("a", AssetKind::Equity, dec!(0))];
        let portfolio = portfolio_of(&assets);
        assert_eq!(portfolio.total_value, Decimal::ZERO);
        assert!(portfolio.allocation.is_empty());
    }

    #[test]
    fn allocation_groups_by_asset_kind() {
        let assets = vec![
            asset("a", AssetKind::Equity, dec!(30)),
            asset("b", AssetKind::Equity, dec!(30)),
            asset("c", AssetKind::Crypto, dec!(40)),
        ];

        let portfolio = portfolio_of(&assets);
        assert_eq!(portfolio.allocation[&AssetKind::Equity], dec!(60));
        assert_eq!(portfolio.allocation[&AssetKind::Crypto], dec!(40));
    }

    #[test]
    fn asset_with_no_transactions_folds_to_zero() {
        assert_eq!(position(&Id::from_string("a"), &[]), Position::default());
    }
}
