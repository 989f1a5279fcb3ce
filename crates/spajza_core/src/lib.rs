//! Core domain logic for the Špajza shopping list.
//! This crate is the single source of truth for list invariants; every
//! presentation layer drives it through `ListService`.

pub mod db;
pub mod logging;
pub mod model;
pub mod recipe;
pub mod service;
pub mod store;
pub mod sync;

pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::collection::{Collection, NormalizeReport, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};
pub use model::product::{Product, ProductId, ProductStatus};
pub use recipe::{
    GeminiConfig, GeminiRecipeClient, RecipeAdvisor, RecipeClient, RecipeError, Source,
    Suggestion,
};
pub use service::list_service::{ListError, ListService};
pub use service::transfer::ImportError;
pub use service::view::{CategoryGroup, ViewTab};
pub use store::collection_store::CollectionStore;
pub use store::kv::{KeyValueStore, StoreError, StoreResult};
pub use store::memory::MemoryKeyValueStore;
pub use store::settings::{SettingsError, SettingsStore};
pub use store::sqlite::SqliteKeyValueStore;
pub use sync::coordinator::{MirrorCoordinator, SyncError, SyncTrigger};
pub use sync::mirror::{HttpMirrorClient, HttpMirrorConfig, MirrorClient, MirrorError, MirrorPayload};
pub use sync::push_queue::{FlushError, PushQueue, PushStatus};
pub use sync::reconcile::reconcile;
pub use sync::sequencer::{RequestSequencer, RequestTicket};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
