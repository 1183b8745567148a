mod asset;
mod asset_transaction;
mod bill;
mod id;
mod portfolio;
mod settings;
mod transaction;

pub use asset::{Asset, AssetKind, AssetPatch, NewAsset};
pub use asset_transaction::{
    AssetOperation, AssetTransaction, AssetTransactionPatch, NewAssetTransaction,
};
pub use bill::{BillPatch, Cadence, NewBill, RecurringBill};
pub use id::{FixedIdGenerator, Id, IdGenerator, UuidIdGenerator};
pub use portfolio::Portfolio;
pub use settings::{SettingsPatch, Theme, UserSettings, WeekStart};
pub use transaction::{
    NewTransaction, RecurringInterval, Transaction, TransactionKind, TransactionPatch,
};

/// Records addressable by their identifier.
pub trait Keyed {
    fn id(&self) -> &Id;
}
