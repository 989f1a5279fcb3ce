//! In-memory key-value store for tests and ephemeral sessions.

use crate::store::kv::{KeyValueStore, StoreError, StoreResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// `BTreeMap`-backed store with switchable write failures.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RefCell<BTreeMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until switched back.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if self.reject_writes.get() {
            return Err(StoreError::WriteRejected("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        self.ensure_writable()?;
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> StoreResult<()> {
        self.ensure_writable()?;
        let mut map = self.entries.borrow_mut();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}
