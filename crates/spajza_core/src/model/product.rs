//! Product domain model.
//!
//! # Responsibility
//! - Define the canonical shopping/inventory entry.
//! - Keep the JSON field names compatible with persisted and mirrored data.
//!
//! # Invariants
//! - `id` is stable and never reused for another product.
//! - `quantity` is either unset or a non-blank free-text string.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque product identifier.
///
/// Locally created products get UUID v4 text; ids arriving through import
/// or the mirror are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whether a product is on the active shopping list or already at home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// On the shopping list.
    #[default]
    Needed,
    /// In the pantry / crossed off.
    Stocked,
}

impl ProductStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Needed => Self::Stocked,
            Self::Stocked => Self::Needed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Needed => "needed",
            Self::Stocked => "stocked",
        }
    }
}

/// One shopping/inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Missing in older data; an empty value is reassigned to the fallback
    /// category when the collection is normalized.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
    /// Free text such as `2ks` or `1kg`. No unit parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl Product {
    /// Creates a `needed` product with a generated id.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self::with_id(
            ProductId::generate(),
            name,
            category,
            ProductStatus::Needed,
        )
    }

    /// Creates a product with a caller-provided id.
    ///
    /// Used by seed data and tests where identity already exists.
    pub fn with_id(
        id: ProductId,
        name: impl Into<String>,
        category: impl Into<String>,
        status: ProductStatus,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            status,
            quantity: None,
        }
    }

    /// Sets quantity text, storing blank input as unset.
    pub fn with_quantity(mut self, quantity: &str) -> Self {
        self.quantity = normalize_quantity(quantity);
        self
    }

    pub fn is_needed(&self) -> bool {
        self.status == ProductStatus::Needed
    }

    pub fn is_stocked(&self) -> bool {
        self.status == ProductStatus::Stocked
    }
}

/// Trims quantity input; blank text means "unset".
pub fn normalize_quantity(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_quantity, Product, ProductId, ProductStatus};

    #[test]
    fn toggled_is_an_involution() {
        assert_eq!(ProductStatus::Needed.toggled(), ProductStatus::Stocked);
        assert_eq!(
            ProductStatus::Stocked.toggled().toggled(),
            ProductStatus::Stocked
        );
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ProductId::generate(), ProductId::generate());
    }

    #[test]
    fn blank_quantity_is_unset() {
        assert_eq!(normalize_quantity("   "), None);
        assert_eq!(normalize_quantity(" 2ks "), Some("2ks".to_string()));
    }

    #[test]
    fn json_omits_unset_quantity_and_uses_lowercase_status() {
        let product = Product::with_id(
            ProductId::new("1"),
            "Mlieko",
            "Mliečne výrobky",
            ProductStatus::Stocked,
        );
        let json = serde_json::to_value(&product).expect("product should serialize");
        assert_eq!(json["id"], "1");
        assert_eq!(json["status"], "stocked");
        assert!(json.get("quantity").is_none());
    }

    #[test]
    fn json_without_category_or_status_uses_defaults() {
        let product: Product = serde_json::from_str(r#"{"id":"7","name":"Soľ"}"#)
            .expect("minimal product should parse");
        assert_eq!(product.category, "");
        assert_eq!(product.status, ProductStatus::Needed);
        assert_eq!(product.quantity, None);
    }

    #[test]
    fn json_with_unknown_status_is_rejected() {
        let parsed =
            serde_json::from_str::<Product>(r#"{"id":"7","name":"Soľ","status":"gone"}"#);
        assert!(parsed.is_err());
    }
}
