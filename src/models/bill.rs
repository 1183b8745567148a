use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

use super::{Id, IdGenerator, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Monthly,
    Yearly,
}

/// A recurring bill or subscription.
///
/// `next_due_date` is `None` for perpetual subscriptions that have no fixed
/// due date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBill {
    pub id: Id,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub cadence: Cadence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    pub account: String,
    pub merchant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBill {
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub cadence: Cadence,
    pub next_due_date: Option<NaiveDate>,
    pub account: String,
    pub merchant: String,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl RecurringBill {
    pub fn new_with_generator(ids: &dyn IdGenerator, clock: &dyn Clock, data: NewBill) -> Self {
        let now = clock.now();
        Self {
            id: ids.new_id(),
            name: data.name,
            amount: data.amount,
            currency: data.currency,
            category: data.category,
            cadence: data.cadence,
            next_due_date: data.next_due_date,
            account: data.account,
            merchant: data.merchant,
            notes: data.notes,
            is_active: data.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Keyed for RecurringBill {
    fn id(&self) -> &Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct BillPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub cadence: Option<Cadence>,
    pub next_due_date: Option<Option<NaiveDate>>,
    pub account: Option<String>,
    pub merchant: Option<String>,
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl BillPatch {
    pub fn apply_to(self, bill: &mut RecurringBill) {
        if let Some(v) = self.name {
            bill.name = v;
        }
        if let Some(v) = self.amount {
            bill.amount = v;
        }
        if let Some(v) = self.currency {
            bill.currency = v;
        }
        if let Some(v) = self.category {
            bill.category = v;
        }
        if let Some(v) = self.cadence {
            bill.cadence = v;
        }
        if let Some(v) = self.next_due_date {
            bill.next_due_date = v;
        }
        if let Some(v) = self.account {
            bill.account = v;
        }
        if let Some(v) = self.merchant {
            bill.merchant = v;
        }
        if let Some(v) = self.notes {
            bill.notes = v;
        }
        if let Some(v) = self.is_active {
            bill.is_active = v;
        }
    }
}
