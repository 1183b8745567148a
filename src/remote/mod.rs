mod http;
mod memory;

pub use http::HttpDocumentMirror;
pub use memory::MemoryMirror;

use std::fmt;

use anyhow::Result;
use serde_json::Value;

use crate::models::Id;

/// The four remote document collections, one per entity kind.
///
/// Names match the original data set's collection names, so a mirror
/// populated by an older client merges cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Transactions,
    Assets,
    AssetTransactions,
    Bills,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Assets => "assets",
            Collection::AssetTransactions => "assetTransactions",
            Collection::Bills => "bills",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote document store keyed by record id, one collection per entity kind.
///
/// Every call is best-effort from the engine's point of view: failures are
/// logged and swallowed at the call site, never retried. Records handed to
/// `upsert` must already have absent optional fields stripped (the engine's
/// serde layer does this).
#[async_trait::async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Current connectivity. The engine polls this before every push and
    /// skips remote work entirely while offline.
    fn is_online(&self) -> bool;

    async fn upsert(&self, collection: Collection, id: &Id, record: Value) -> Result<()>;
    async fn delete(&self, collection: Collection, id: &Id) -> Result<()>;
    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>>;
}
