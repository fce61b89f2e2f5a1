//! Aura Fashions storefront client library.
//!
//! The transactional state layer behind the storefront UI: who the current
//! user is, what is in the cart, and how a cart becomes an order. Everything
//! else (pages, styling, rendering) lives in the shell that embeds this
//! crate.
//!
//! # Architecture
//!
//! - [`store`] - durable key-value storage (cart, token, cached profile),
//!   behind a trait so tests can swap in an in-memory fake
//! - [`session`] - authentication state machine; exchanges provider
//!   credentials (or the backend-gated developer shortcut) for a bearer
//!   token and revalidates it on startup
//! - [`cart`] - unique-keyed line collection with derived totals; fully
//!   synchronous, persisted write-through
//! - [`checkout`] - one-shot conversion of cart + shipping form into an
//!   order submission
//! - [`api`] - reqwest JSON client for the catalog API; the session and
//!   checkout components consume it through narrow gateway traits
//!
//! # Example
//!
//! ```rust,ignore
//! use aura_client::api::ApiClient;
//! use aura_client::cart::CartManager;
//! use aura_client::config::ClientConfig;
//! use aura_client::session::SessionManager;
//! use aura_client::store::FileStore;
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config);
//!
//! let mut session = SessionManager::new(api.clone(), FileStore::open(&config.data_dir)?);
//! session.initialize().await?;
//!
//! let mut cart = CartManager::load(FileStore::open(&config.data_dir)?)?;
//! cart.add_item(product_ref, 1)?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
