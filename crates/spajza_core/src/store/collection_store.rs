//! Collection persistence over a key-value store.
//!
//! # Responsibility
//! - Load the collection snapshot at startup, falling back to seed data.
//! - Save products and categories together after every mutation.
//!
//! # Invariants
//! - `load()` never fails and always returns a normalized collection.
//! - Write failures are logged, never raised.

use crate::model::collection::{default_categories, seed_products, Collection};
use crate::store::kv::KeyValueStore;
use log::{info, warn};
use serde::de::DeserializeOwned;

/// Key holding the JSON product array.
pub const PRODUCTS_KEY: &str = "shopping-list-data";
/// Key holding the JSON category array.
pub const CATEGORIES_KEY: &str = "shopping-list-categories";

/// Reads and writes collection snapshots.
pub struct CollectionStore<S> {
    kv: S,
}

impl<S: KeyValueStore> CollectionStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Loads the persisted collection.
    ///
    /// Each key falls back to its seed value independently when absent or
    /// unparsable, then the orphan policy is applied.
    pub fn load(&self) -> Collection {
        let products = self.read_json(PRODUCTS_KEY).unwrap_or_else(seed_products);
        let categories = self
            .read_json(CATEGORIES_KEY)
            .unwrap_or_else(default_categories);

        let (collection, report) = Collection::new(products, categories).normalized();
        info!(
            "event=collection_load module=store status=ok products={} categories={} reassigned={} duplicate_categories={}",
            collection.products.len(),
            collection.categories.len(),
            report.reassigned_products,
            report.duplicate_categories
        );
        collection
    }

    /// Persists both halves of the snapshot in one atomic write.
    ///
    /// Returns `false` when the write failed; the failure is already logged.
    pub fn save(&self, collection: &Collection) -> bool {
        let encoded = serde_json::to_string(&collection.products).and_then(|products| {
            serde_json::to_string(&collection.categories).map(|categories| (products, categories))
        });
        let (products, categories) = match encoded {
            Ok(pair) => pair,
            Err(err) => {
                warn!(
                    "event=collection_save module=store status=error error_code=encode_failed error={err}"
                );
                return false;
            }
        };

        match self
            .kv
            .put_many(&[(PRODUCTS_KEY, products), (CATEGORIES_KEY, categories)])
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=collection_save module=store status=error error_code=write_failed error={err}"
                );
                false
            }
        }
    }

    /// Deletes the persisted snapshot so the next `load()` yields the seed.
    pub fn reset(&self) -> bool {
        match self.kv.remove_many(&[PRODUCTS_KEY, CATEGORIES_KEY]) {
            Ok(()) => {
                info!("event=collection_reset module=store status=ok");
                true
            }
            Err(err) => {
                warn!("event=collection_reset module=store status=error error={err}");
                false
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    "event=collection_load module=store status=error error_code=read_failed key={key} error={err}"
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=collection_load module=store status=fallback error_code=parse_failed key={key} error={err}"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionStore, CATEGORIES_KEY, PRODUCTS_KEY};
    use crate::model::collection::{default_categories, seed_products, Collection};
    use crate::store::kv::KeyValueStore;
    use crate::store::memory::MemoryKeyValueStore;

    #[test]
    fn empty_store_loads_seed() {
        let store = CollectionStore::new(MemoryKeyValueStore::new());
        assert_eq!(store.load(), Collection::seed());
    }

    #[test]
    fn corrupt_products_fall_back_without_touching_categories() {
        let kv = MemoryKeyValueStore::new();
        kv.put(PRODUCTS_KEY, "{not json".to_string()).unwrap();
        kv.put(CATEGORIES_KEY, r#"["Pečivo","Mliečne výrobky","Ovocie a zelenina"]"#.to_string())
            .unwrap();

        let loaded = CollectionStore::new(&kv).load();
        assert_eq!(loaded.products, seed_products());
        assert_eq!(
            loaded.categories,
            vec!["Pečivo", "Mliečne výrobky", "Ovocie a zelenina"]
        );
    }

    #[test]
    fn wrong_json_shape_falls_back() {
        let kv = MemoryKeyValueStore::new();
        kv.put(CATEGORIES_KEY, r#"{"a":1}"#.to_string()).unwrap();
        let loaded = CollectionStore::new(&kv).load();
        assert_eq!(loaded.categories, default_categories());
    }

    #[test]
    fn failed_save_reports_false_and_keeps_previous_blob() {
        let kv = MemoryKeyValueStore::new();
        let store = CollectionStore::new(&kv);
        assert!(store.save(&Collection::seed()));

        kv.set_reject_writes(true);
        assert!(!store.save(&Collection::default()));
        assert_eq!(store.load(), Collection::seed());
    }

    #[test]
    fn reset_returns_to_seed() {
        let kv = MemoryKeyValueStore::new();
        let store = CollectionStore::new(&kv);
        let mut collection = Collection::seed();
        collection.products.clear();
        store.save(&collection);
        assert!(store.load().products.is_empty());

        assert!(store.reset());
        assert_eq!(store.load(), Collection::seed());
    }
}
