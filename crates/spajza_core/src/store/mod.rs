//! Persistent store adapter.
//!
//! # Responsibility
//! - Define the string-keyed key-value contract the app persists through.
//! - Map collection snapshots and settings onto well-known keys.
//!
//! # Invariants
//! - Loading never fails: absent or corrupt data falls back to seed values.
//! - Multi-key writes are atomic, so products and categories never diverge.

pub mod collection_store;
pub mod kv;
pub mod memory;
pub mod settings;
pub mod sqlite;
