//! List/category state manager.
//!
//! # Responsibility
//! - Hold the single in-memory collection for one session.
//! - Expose add/remove/update/toggle operations over products and categories.
//! - Persist and schedule a mirror push exactly once per logical change.
//!
//! # Invariants
//! - Mutations are synchronous; network work only happens on the push queue.
//! - Failed preconditions (`ListError`) leave the collection untouched.
//! - The in-memory collection is always normalized (no orphan categories).

use crate::model::collection::{Collection, FALLBACK_CATEGORY};
use crate::model::product::{normalize_quantity, Product, ProductId, ProductStatus};
use crate::service::transfer::{export_collection, parse_import, ImportError};
use crate::service::view::{
    filtered_view, group_by_category, shopping_list_text, CategoryGroup, ViewTab,
};
use crate::store::collection_store::CollectionStore;
use crate::store::kv::KeyValueStore;
use crate::sync::mirror::MirrorPayload;
use crate::sync::push_queue::PushQueue;
use crate::sync::reconcile::reconcile;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Product name is blank after trimming.
    EmptyName,
    /// Category still referenced by products.
    CategoryInUse {
        category: String,
        product_count: usize,
    },
    CategoryNotFound(String),
    Import(ImportError),
}

impl Display for ListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "product name cannot be empty"),
            Self::CategoryInUse {
                category,
                product_count,
            } => write!(
                f,
                "category `{category}` still contains {product_count} product(s)"
            ),
            Self::CategoryNotFound(category) => write!(f, "category not found: `{category}`"),
            Self::Import(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Import(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ImportError> for ListError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

/// Whether a commit should be mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Propagation {
    Mirror,
    LocalOnly,
}

/// Owner of the session's collection.
pub struct ListService<S: KeyValueStore> {
    store: CollectionStore<S>,
    collection: Collection,
    push_queue: Option<PushQueue>,
}

impl<S: KeyValueStore> ListService<S> {
    /// Loads the persisted collection (seed on first run).
    pub fn open(kv: S) -> Self {
        let store = CollectionStore::new(kv);
        let collection = store.load();
        Self {
            store,
            collection,
            push_queue: None,
        }
    }

    /// Mirrors every following mutation through `queue`.
    pub fn attach_mirror(&mut self, queue: PushQueue) {
        self.push_queue = Some(queue);
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.collection.product(id)
    }

    pub fn categories(&self) -> &[String] {
        &self.collection.categories
    }

    pub fn view(&self, tab: ViewTab, search: &str) -> Vec<&Product> {
        filtered_view(&self.collection, tab, search)
    }

    pub fn grouped_view(&self, tab: ViewTab, search: &str) -> Vec<CategoryGroup<'_>> {
        group_by_category(&self.view(tab, search))
    }

    pub fn shopping_list_text(&self) -> String {
        shopping_list_text(&self.collection)
    }

    pub fn export_text(&self) -> Result<String, serde_json::Error> {
        export_collection(&self.collection)
    }

    /// Adds a `needed` product and returns its fresh id.
    ///
    /// # Contract
    /// - Blank names are rejected with `ListError::EmptyName`.
    /// - Blank quantity is stored as unset.
    /// - An unknown category is replaced by the fallback category.
    pub fn add_product(
        &mut self,
        name: &str,
        quantity: Option<&str>,
        category: &str,
    ) -> Result<ProductId, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::EmptyName);
        }

        let mut next = self.collection.clone();
        let category = if next.has_category(category.trim()) {
            category.trim()
        } else {
            if !next.has_category(FALLBACK_CATEGORY) {
                next.categories.push(FALLBACK_CATEGORY.to_string());
            }
            FALLBACK_CATEGORY
        };

        let mut product = Product::new(name, category);
        product.quantity = quantity.and_then(normalize_quantity);
        let id = product.id.clone();
        next.products.push(product);

        self.commit("product_add", next, Propagation::Mirror);
        Ok(id)
    }

    /// Flips `needed` ↔ `stocked`. `None` when `id` is unknown.
    pub fn toggle_status(&mut self, id: &ProductId) -> Option<ProductStatus> {
        let mut next = self.collection.clone();
        let product = next.products.iter_mut().find(|product| &product.id == id)?;
        product.status = product.status.toggled();
        let status = product.status;

        self.commit("product_toggle", next, Propagation::Mirror);
        Some(status)
    }

    /// Replaces the quantity text; blank clears it. `false` when `id` is unknown.
    pub fn update_quantity(&mut self, id: &ProductId, text: &str) -> bool {
        let mut next = self.collection.clone();
        let Some(product) = next.products.iter_mut().find(|product| &product.id == id) else {
            return false;
        };
        product.quantity = normalize_quantity(text);

        self.commit("product_quantity", next, Propagation::Mirror);
        true
    }

    /// Removes a product. Callers confirm with the user first.
    pub fn delete_product(&mut self, id: &ProductId) -> Option<Product> {
        let mut next = self.collection.clone();
        let index = next.products.iter().position(|product| &product.id == id)?;
        let removed = next.products.remove(index);

        self.commit("product_delete", next, Propagation::Mirror);
        Some(removed)
    }

    /// Appends a category. `false` when blank or already present.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.collection.has_category(name) {
            return false;
        }

        let mut next = self.collection.clone();
        next.categories.push(name.to_string());
        self.commit("category_add", next, Propagation::Mirror);
        true
    }

    /// Removes an unreferenced category. Callers confirm with the user first.
    pub fn delete_category(&mut self, name: &str) -> Result<(), ListError> {
        let Some(index) = self.collection.category_position(name) else {
            return Err(ListError::CategoryNotFound(name.to_string()));
        };
        let product_count = self.collection.products_in_category(name);
        if product_count > 0 {
            return Err(ListError::CategoryInUse {
                category: name.to_string(),
                product_count,
            });
        }

        let mut next = self.collection.clone();
        next.categories.remove(index);
        self.commit("category_delete", next, Propagation::Mirror);
        Ok(())
    }

    /// Overwrites the whole collection with local data (e.g. a restore).
    pub fn replace_all(&mut self, collection: Collection) {
        let (next, _) = collection.normalized();
        self.commit("collection_replace", next, Propagation::Mirror);
    }

    /// Applies a mirror pull. The result is not pushed back.
    pub fn apply_remote(&mut self, payload: MirrorPayload) {
        let next = reconcile(&self.collection, payload);
        self.commit("collection_pull", next, Propagation::LocalOnly);
    }

    /// Replaces everything with backup text. Callers confirm first.
    ///
    /// # Errors
    /// - `ListError::Import` for invalid text; the collection is untouched.
    pub fn import_text(&mut self, text: &str) -> Result<(), ListError> {
        let next = parse_import(text, &self.collection)?;
        self.commit("collection_import", next, Propagation::Mirror);
        Ok(())
    }

    /// Deletes the persisted snapshot and returns to seed data.
    ///
    /// Local only: the mirror keeps its copy until the next edit.
    /// Returns `false` when the delete failed; the collection is then kept
    /// so memory and store stay identical.
    pub fn reset(&mut self) -> bool {
        if !self.store.reset() {
            warn!("event=collection_reset module=service status=error kept_current=true");
            return false;
        }
        self.collection = Collection::seed();
        info!("event=collection_reset module=service status=ok");
        true
    }

    fn commit(&mut self, operation: &'static str, next: Collection, propagation: Propagation) {
        self.collection = next;
        let persisted = self.store.save(&self.collection);

        let mirrored = match (&self.push_queue, propagation) {
            (Some(queue), Propagation::Mirror) => {
                queue.schedule(self.collection.clone());
                true
            }
            _ => false,
        };

        info!(
            "event={operation} module=service status=ok products={} categories={} persisted={persisted} mirrored={mirrored}",
            self.collection.products.len(),
            self.collection.categories.len()
        );
    }
}
