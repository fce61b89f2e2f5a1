//! Aura Core - Shared types library.
//!
//! This crate provides common types used across all Aura Fashions components:
//! - `client` - Storefront client library (session, cart, checkout)
//! - `cli` - Command-line shell driving the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
