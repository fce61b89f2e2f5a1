//! Command implementations.
//!
//! Each command runs against a [`Shell`]: the configured API client plus
//! the session and cart state containers, all sharing one durable store
//! handle.

#![allow(clippy::print_stdout)]

pub mod cart;
pub mod session;
pub mod shop;

use aura_client::api::ApiClient;
use aura_client::cart::CartManager;
use aura_client::config::ClientConfig;
use aura_client::error::{ClientError, Result};
use aura_client::session::SessionManager;
use aura_client::store::{FileStore, SharedStore};

/// The store handle every container shares.
pub type Store = SharedStore<FileStore>;

/// Everything a command needs: configuration, the API client, and an
/// initialized (revalidated) session.
pub struct Shell {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub store: Store,
    pub session: SessionManager<ApiClient, Store>,
}

impl Shell {
    /// Load configuration, open the durable store, and initialize the
    /// session (hydrate + revalidate).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, storage, or session hydration
    /// fails. A failed revalidation is not an error here; the session
    /// resolves it to an authenticated or anonymous state on its own.
    pub async fn init() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        let api = ApiClient::new(&config)?;
        let store = SharedStore::new(FileStore::open(&config.data_dir)?);

        let mut session = SessionManager::new(api.clone(), store.clone());
        session.initialize().await?;

        Ok(Self {
            config,
            api,
            store,
            session,
        })
    }

    /// Hydrate the cart from the shared store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn cart(&self) -> Result<CartManager<Store>> {
        Ok(CartManager::load(self.store.clone())?)
    }

    /// The bearer token, or a "not logged in" error for commands that
    /// require one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when no session is held.
    pub fn require_token(&self) -> Result<String> {
        self.session
            .token()
            .map(ToString::to_string)
            .ok_or(ClientError::NotAuthenticated)
    }
}
