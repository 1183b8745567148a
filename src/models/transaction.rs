use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

use super::{Id, IdGenerator, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Weekly,
    Monthly,
    Yearly,
}

/// An income or expense entry.
///
/// Field names follow the on-disk/remote wire format (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_interval: Option<RecurringInterval>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction fields as supplied by the caller; id and timestamps are
/// assigned by the engine.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
}

impl Transaction {
    pub fn new_with_generator(
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
        data: NewTransaction,
    ) -> Self {
        let now = clock.now();
        Self {
            id: ids.new_id(),
            kind: data.kind,
            amount: data.amount,
            currency: data.currency,
            category: data.category,
            description: data.description,
            date: data.date,
            is_recurring: data.is_recurring,
            recurring_interval: data.recurring_interval,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Keyed for Transaction {
    fn id(&self) -> &Id {
        &self.id
    }
}

/// Partial update for a transaction. `None` fields are left untouched;
/// `recurring_interval` uses a nested `Option` so it can be cleared.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurring_interval: Option<Option<RecurringInterval>>,
}

impl TransactionPatch {
    pub fn apply_to(self, txn: &mut Transaction) {
        if let Some(v) = self.kind {
            txn.kind = v;
        }
        if let Some(v) = self.amount {
            txn.amount = v;
        }
        if let Some(v) = self.currency {
            txn.currency = v;
        }
        if let Some(v) = self.category {
            txn.category = v;
        }
        if let Some(v) = self.description {
            txn.description = v;
        }
        if let Some(v) = self.date {
            txn.date = v;
        }
        if let Some(v) = self.is_recurring {
            txn.is_recurring = v;
        }
        if let Some(v) = self.recurring_interval {
            txn.recurring_interval = v;
        }
    }
}
