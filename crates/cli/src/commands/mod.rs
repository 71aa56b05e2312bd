//! Command implementations.
//!
//! Output goes through `tracing` at `info` so it shares the subscriber's
//! formatting and can be silenced with `RUST_LOG`.

pub mod cart;
pub mod cashiers;
pub mod checkout;
pub mod menu;
pub mod orders;
pub mod session;

use std::sync::Arc;

use foodpoint_client::{
    ApiClient, CartStore, ClientConfig, DurableStorage, FileStorage, SessionStore,
};

/// Stores and clients shared by every command.
pub struct Context {
    pub config: ClientConfig,
    pub session: SessionStore,
    pub cart: CartStore,
    pub api: ApiClient,
}

impl Context {
    /// Open durable storage and wire the stores to the API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built.
    pub fn load(config: ClientConfig) -> foodpoint_client::Result<Self> {
        let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(&config.storage_path));

        let session = SessionStore::new(storage.clone());
        session.initialize();
        let cart = CartStore::load(storage);
        let api = ApiClient::from_config(&config, Arc::new(session.clone()))?;

        Ok(Self {
            config,
            session,
            cart,
            api,
        })
    }
}
