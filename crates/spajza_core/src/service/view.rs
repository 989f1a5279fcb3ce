//! Derived read views over a collection.
//!
//! # Invariants
//! - Views are recomputed on demand and never persisted.
//! - Canonical order: category display order (unknown categories last),
//!   then name case-insensitively, then id.

use crate::model::collection::Collection;
use crate::model::product::Product;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which products a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTab {
    /// Only `needed` products.
    #[default]
    Shopping,
    /// Everything; the pantry screen.
    Inventory,
    All,
}

impl ViewTab {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shopping => "shopping",
            Self::Inventory => "inventory",
            Self::All => "all",
        }
    }

    fn admits(self, product: &Product) -> bool {
        match self {
            Self::Shopping => product.is_needed(),
            Self::Inventory | Self::All => true,
        }
    }
}

impl Display for ViewTab {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewTab {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shopping" => Ok(Self::Shopping),
            "inventory" => Ok(Self::Inventory),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown view `{other}`; expected shopping|inventory|all"
            )),
        }
    }
}

/// Products of one category, in view order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub products: Vec<&'a Product>,
}

/// Filters by tab and search text, then sorts canonically.
///
/// Search is a case-insensitive substring match on the name; blank search
/// text matches everything.
pub fn filtered_view<'a>(collection: &'a Collection, tab: ViewTab, search: &str) -> Vec<&'a Product> {
    let needle = search.trim().to_lowercase();
    let mut view: Vec<&Product> = collection
        .products
        .iter()
        .filter(|product| tab.admits(product))
        .filter(|product| needle.is_empty() || product.name.to_lowercase().contains(&needle))
        .collect();
    view.sort_by(|left, right| canonical_order(collection, left, right));
    view
}

/// Partitions a view by category, keeping first-appearance order.
pub fn group_by_category<'a>(view: &[&'a Product]) -> Vec<CategoryGroup<'a>> {
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    for &product in view {
        match groups
            .iter_mut()
            .find(|group| group.category == product.category)
        {
            Some(group) => group.products.push(product),
            None => groups.push(CategoryGroup {
                category: product.category.as_str(),
                products: vec![product],
            }),
        }
    }
    groups
}

/// Plain-text shopping list for sharing: one `• name (quantity)` line per
/// needed product.
pub fn shopping_list_text(collection: &Collection) -> String {
    filtered_view(collection, ViewTab::Shopping, "")
        .into_iter()
        .map(|product| match &product.quantity {
            Some(quantity) => format!("• {} ({quantity})", product.name),
            None => format!("• {}", product.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn canonical_order(collection: &Collection, left: &Product, right: &Product) -> Ordering {
    let rank = |product: &Product| {
        collection
            .category_position(&product.category)
            .unwrap_or(usize::MAX)
    };
    rank(left)
        .cmp(&rank(right))
        .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
        .then_with(|| left.id.cmp(&right.id))
}

#[cfg(test)]
mod tests {
    use super::{filtered_view, group_by_category, shopping_list_text, ViewTab};
    use crate::model::collection::Collection;
    use crate::model::product::{Product, ProductId, ProductStatus};

    fn names(view: &[&Product]) -> Vec<String> {
        view.iter().map(|product| product.name.clone()).collect()
    }

    #[test]
    fn shopping_tab_shows_needed_in_category_order() {
        let collection = Collection::seed();
        let view = filtered_view(&collection, ViewTab::Shopping, "");
        // Pečivo precedes Mliečne výrobky in the default category order.
        assert_eq!(names(&view), vec!["Chlieb", "Mlieko"]);
    }

    #[test]
    fn inventory_tab_sorts_by_category_then_name() {
        let collection = Collection::seed();
        let view = filtered_view(&collection, ViewTab::Inventory, "");
        assert_eq!(names(&view), vec!["Jablká", "Chlieb", "Mlieko", "Vajíčka"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let collection = Collection::seed();
        let view = filtered_view(&collection, ViewTab::All, "  MLIE ");
        assert_eq!(names(&view), vec!["Mlieko"]);
        assert!(filtered_view(&collection, ViewTab::All, "xyz").is_empty());
    }

    #[test]
    fn name_order_ignores_case_within_category() {
        let mut collection = Collection::new(vec![], vec!["A".to_string()]);
        for (id, name) in [("1", "banán"), ("2", "Avokádo"), ("3", "cibuľa")] {
            collection.products.push(Product::with_id(
                ProductId::new(id),
                name,
                "A",
                ProductStatus::Needed,
            ));
        }
        let view = filtered_view(&collection, ViewTab::Shopping, "");
        assert_eq!(names(&view), vec!["Avokádo", "banán", "cibuľa"]);
    }

    #[test]
    fn unknown_categories_sort_last() {
        let mut collection = Collection::new(vec![], vec!["A".to_string()]);
        collection.products.push(Product::with_id(
            ProductId::new("1"),
            "a-first",
            "Elsewhere",
            ProductStatus::Needed,
        ));
        collection.products.push(Product::with_id(
            ProductId::new("2"),
            "z-last",
            "A",
            ProductStatus::Needed,
        ));
        let view = filtered_view(&collection, ViewTab::All, "");
        assert_eq!(names(&view), vec!["z-last", "a-first"]);
    }

    #[test]
    fn grouping_preserves_view_order() {
        let collection = Collection::seed();
        let view = filtered_view(&collection, ViewTab::Inventory, "");
        let groups = group_by_category(&view);

        let categories: Vec<&str> = groups.iter().map(|group| group.category).collect();
        assert_eq!(categories, vec!["Ovocie a zelenina", "Pečivo", "Mliečne výrobky"]);
        assert_eq!(names(&groups[2].products), vec!["Mlieko", "Vajíčka"]);
    }

    #[test]
    fn share_text_lists_needed_products_with_quantities() {
        let mut collection = Collection::seed();
        collection.products[1].quantity = None;
        assert_eq!(shopping_list_text(&collection), "• Chlieb\n• Mlieko (2ks)");
    }

    #[test]
    fn tab_parses_from_text() {
        assert_eq!("Inventory".parse::<ViewTab>().unwrap(), ViewTab::Inventory);
        assert!("pantry".parse::<ViewTab>().is_err());
    }
}
