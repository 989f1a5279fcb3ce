//! Shopping-list use-case services.
//!
//! # Responsibility
//! - Own the in-memory collection and funnel every mutation through one
//!   commit path (persist, then schedule a mirror push).
//! - Derive filtered and grouped read views.
//! - Parse and produce the manual backup text.

pub mod list_service;
pub mod transfer;
pub mod view;
