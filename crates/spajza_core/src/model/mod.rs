//! Shopping-list domain model.
//!
//! # Responsibility
//! - Define the product record and the paired collection snapshot.
//! - Own the seed data used on first run and after corrupt loads.
//!
//! # Invariants
//! - Every product is identified by a stable `ProductId`.
//! - Products and categories are always persisted and synced together.

pub mod collection;
pub mod product;
