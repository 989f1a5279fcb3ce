//! Manual backup import/export.
//!
//! The text format is the persisted JSON shape: `{products, categories}`.
//! Import is all-or-nothing and reuses the mirror reconciliation policy.

use crate::model::collection::Collection;
use crate::sync::mirror::MirrorPayload;
use crate::sync::reconcile::reconcile;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Import text could not be turned into a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Not JSON at all.
    InvalidJson(String),
    /// JSON, but without a usable `products` array.
    InvalidShape(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "import text is not valid JSON: {message}"),
            Self::InvalidShape(message) => {
                write!(f, "import data has an unsupported format: {message}")
            }
        }
    }
}

impl Error for ImportError {}

/// Serializes `collection` into backup text.
pub fn export_collection(collection: &Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string(collection)
}

/// Parses backup text into the collection that replaces `local`.
///
/// # Contract
/// - `products` is required; `categories` is optional and defaults to the
///   local set.
/// - Orphaned product categories move to the fallback category.
pub fn parse_import(text: &str, local: &Collection) -> Result<Collection, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(text.trim()).map_err(|err| ImportError::InvalidJson(err.to_string()))?;
    let payload: MirrorPayload =
        serde_json::from_value(value).map_err(|err| ImportError::InvalidShape(err.to_string()))?;
    Ok(reconcile(local, payload))
}

#[cfg(test)]
mod tests {
    use super::{export_collection, parse_import, ImportError};
    use crate::model::collection::Collection;

    #[test]
    fn export_then_import_reproduces_collection() {
        let collection = Collection::seed();
        let text = export_collection(&collection).unwrap();
        let imported = parse_import(&text, &Collection::default()).unwrap();
        assert_eq!(imported, collection);
    }

    #[test]
    fn export_uses_persisted_field_names() {
        let text = export_collection(&Collection::seed()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["products"].is_array());
        assert!(value["categories"].is_array());
        assert_eq!(value["products"][0]["quantity"], "2ks");
    }

    #[test]
    fn garbage_is_a_json_error() {
        let err = parse_import("nie je to json", &Collection::seed()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidJson(_)));
    }

    #[test]
    fn json_without_products_is_a_shape_error() {
        for text in [r#"{"categories":["A"]}"#, "[]", r#"{"products":"many"}"#] {
            let err = parse_import(text, &Collection::seed()).unwrap_err();
            assert!(matches!(err, ImportError::InvalidShape(_)), "{text}");
        }
    }

    #[test]
    fn missing_categories_keep_local_set() {
        let local = Collection::seed();
        let imported = parse_import(r#"{"products":[]}"#, &local).unwrap();
        assert!(imported.products.is_empty());
        assert_eq!(imported.categories, local.categories);
    }
}
