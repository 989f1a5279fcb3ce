//! Collection snapshot: products plus ordered categories.
//!
//! # Responsibility
//! - Pair products and categories into the unit of persistence and sync.
//! - Provide seed data and the orphan-category normalization policy.
//!
//! # Invariants
//! - Category names are unique (case-sensitive); order is display order.
//! - After `normalized()`, every product category exists in `categories`
//!   and every quantity is unset or non-blank.

use crate::model::product::{normalize_quantity, Product, ProductId, ProductStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reserved category for products whose category is missing or unknown.
pub const FALLBACK_CATEGORY: &str = "Ostatné";

/// Category set used on first run.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Ovocie a zelenina",
    "Pečivo",
    "Mliečne výrobky",
    "Mäso a údeniny",
    "Trvanlivé potraviny",
    "Nápoje",
    "Drogéria",
    FALLBACK_CATEGORY,
];

/// Products and categories, always read and written together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Collection {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
}

/// What `Collection::normalized` had to repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeReport {
    pub duplicate_categories: usize,
    pub reassigned_products: usize,
    pub fallback_added: bool,
    /// Quantities that were trimmed or cleared.
    pub rewritten_quantities: usize,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_categories == 0
            && self.reassigned_products == 0
            && !self.fallback_added
            && self.rewritten_quantities == 0
    }
}

impl Collection {
    pub fn new(products: Vec<Product>, categories: Vec<String>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// First-run collection: seed products with default categories.
    pub fn seed() -> Self {
        Self::new(seed_products(), default_categories())
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }

    /// Display position of a category, if known.
    pub fn category_position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|category| category == name)
    }

    /// Number of products referencing `name`.
    pub fn products_in_category(&self, name: &str) -> usize {
        self.products
            .iter()
            .filter(|product| product.category == name)
            .count()
    }

    /// Names of all `stocked` products, in collection order.
    pub fn stocked_names(&self) -> Vec<&str> {
        self.products
            .iter()
            .filter(|product| product.is_stocked())
            .map(|product| product.name.as_str())
            .collect()
    }

    /// Applies the orphan policy.
    ///
    /// # Contract
    /// - Duplicate categories collapse to their first occurrence.
    /// - Products referencing an unknown (or empty) category move to
    ///   `FALLBACK_CATEGORY`, which is appended when absent.
    /// - Quantities are trimmed; blank ones become unset.
    pub fn normalized(mut self) -> (Self, NormalizeReport) {
        let mut report = NormalizeReport::default();

        let mut seen = HashSet::new();
        let before = self.categories.len();
        self.categories.retain(|category| seen.insert(category.clone()));
        report.duplicate_categories = before - self.categories.len();

        let known: HashSet<&str> = self.categories.iter().map(String::as_str).collect();
        let mut reassigned = 0;
        for product in &mut self.products {
            if !known.contains(product.category.as_str()) {
                product.category = FALLBACK_CATEGORY.to_string();
                reassigned += 1;
            }
            let quantity = product.quantity.take();
            product.quantity = quantity.as_deref().and_then(normalize_quantity);
            if product.quantity != quantity {
                report.rewritten_quantities += 1;
            }
        }
        report.reassigned_products = reassigned;

        if reassigned > 0 && !self.has_category(FALLBACK_CATEGORY) {
            self.categories.push(FALLBACK_CATEGORY.to_string());
            report.fallback_added = true;
        }

        (self, report)
    }
}

/// Default category set as owned strings.
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|category| category.to_string())
        .collect()
}

/// Products shown on first run.
pub fn seed_products() -> Vec<Product> {
    vec![
        seed("1", "Mlieko", "Mliečne výrobky", ProductStatus::Needed, "2ks"),
        seed("2", "Chlieb", "Pečivo", ProductStatus::Needed, "1ks"),
        seed("3", "Vajíčka", "Mliečne výrobky", ProductStatus::Stocked, "10ks"),
        seed("4", "Jablká", "Ovocie a zelenina", ProductStatus::Stocked, "1kg"),
    ]
}

fn seed(id: &str, name: &str, category: &str, status: ProductStatus, quantity: &str) -> Product {
    Product::with_id(ProductId::new(id), name, category, status).with_quantity(quantity)
}
