use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;

use crate::models::Id;

use super::{Collection, RemoteMirror};

/// In-memory mirror, used in tests and as the inert stand-in when no remote
/// store is configured.
#[derive(Default)]
pub struct MemoryMirror {
    collections: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
    online: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryMirror {
    /// An online, empty mirror.
    pub fn new() -> Self {
        let mirror = Self::default();
        mirror.online.store(true, Ordering::Relaxed);
        mirror
    }

    /// A mirror that reports no connectivity; every engine push is skipped.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// When set, upserts and deletes return errors. Lets tests exercise the
    /// engine's swallow-and-log policy.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Snapshot of one collection's documents, keyed by id.
    pub fn records(&self, collection: Collection) -> BTreeMap<String, Value> {
        self.collections
            .lock()
            .expect("mirror lock poisoned")
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a document directly, as if another client had pushed it.
    pub fn seed(&self, collection: Collection, id: &Id, record: Value) {
        self.collections
            .lock()
            .expect("mirror lock poisoned")
            .entry(collection)
            .or_default()
            .insert(id.to_string(), record);
    }
}

#[async_trait::async_trait]
impl RemoteMirror for MemoryMirror {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    async fn upsert(&self, collection: Collection, id: &Id, record: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            anyhow::bail!("mirror write failure injected");
        }
        self.seed(collection, id, record);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &Id) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            anyhow::bail!("mirror write failure injected");
        }
        self.collections
            .lock()
            .expect("mirror lock poisoned")
            .entry(collection)
            .or_default()
            .remove(id.as_str());
        Ok(())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.records(collection).into_values().collect())
    }
}
