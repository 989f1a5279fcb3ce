//! Reconciliation of a pulled mirror payload with local state.
//!
//! The policy is whole-collection replace: remote products supersede local
//! ones, remote categories supersede local ones when present.

use crate::model::collection::Collection;
use crate::sync::mirror::MirrorPayload;
use log::info;

/// Builds the collection that should become local state after a pull.
pub fn reconcile(local: &Collection, remote: MirrorPayload) -> Collection {
    let categories = remote
        .categories
        .unwrap_or_else(|| local.categories.clone());
    let (collection, report) = Collection::new(remote.products, categories).normalized();

    info!(
        "event=reconcile module=sync status=ok policy=replace products={} categories={} reassigned={} duplicate_categories={}",
        collection.products.len(),
        collection.categories.len(),
        report.reassigned_products,
        report.duplicate_categories
    );
    collection
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use crate::model::collection::{Collection, FALLBACK_CATEGORY};
    use crate::model::product::{Product, ProductId, ProductStatus};
    use crate::sync::mirror::MirrorPayload;

    fn product(id: &str, category: &str) -> Product {
        Product::with_id(ProductId::new(id), "remote", category, ProductStatus::Stocked)
    }

    #[test]
    fn remote_replaces_local_entirely() {
        let local = Collection::seed();
        let remote = MirrorPayload {
            products: vec![product("r1", "Nápoje")],
            categories: Some(vec!["Nápoje".to_string()]),
        };

        let merged = reconcile(&local, remote);
        assert_eq!(merged.products.len(), 1);
        assert_eq!(merged.products[0].id.as_str(), "r1");
        assert_eq!(merged.categories, vec!["Nápoje"]);
    }

    #[test]
    fn missing_remote_categories_keep_local_ones() {
        let local = Collection::seed();
        let remote = MirrorPayload {
            products: vec![product("r1", "Pečivo")],
            categories: None,
        };

        let merged = reconcile(&local, remote);
        assert_eq!(merged.categories, local.categories);
        assert_eq!(merged.products[0].category, "Pečivo");
    }

    #[test]
    fn undeclared_remote_category_moves_to_fallback() {
        let local = Collection::seed();
        let remote = MirrorPayload {
            products: vec![product("r1", "Neznáme")],
            categories: Some(vec!["Pečivo".to_string()]),
        };

        let merged = reconcile(&local, remote);
        assert_eq!(merged.products[0].category, FALLBACK_CATEGORY);
        assert_eq!(merged.categories, vec!["Pečivo", FALLBACK_CATEGORY]);
    }
}
