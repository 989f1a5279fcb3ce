//! Remote mirror synchronization.
//!
//! # Responsibility
//! - Pull and push whole collections against one HTTP endpoint.
//! - Serialize pushes (single-flight) and discard stale pull responses.
//! - Keep the reconciliation policy behind one function.
//!
//! # Invariants
//! - The mirror is last-writer-wins; there is no merge or conflict detection.
//! - Background failures never reach the user; user-triggered ones do.

pub mod coordinator;
pub mod mirror;
pub mod push_queue;
pub mod reconcile;
pub mod sequencer;
