//! FoodPoint Client - session, cart and backend access for the ordering app.
//!
//! # Architecture
//!
//! - [`storage`] - Durable key-value storage shared by the stores
//! - [`session`] - Who is signed in; all-or-nothing token/role/user record
//! - [`cart`] - The pending order basket and its derived total
//! - [`api`] - Typed REST client that signs requests from the session
//! - [`catalog`] - Menu snapshot with single-flight interval refresh
//! - [`checkout`] - Turns the cart into an order
//! - [`routes`] - Redirect decisions driven by the session state
//!
//! The stores are synchronous and cheap to clone. Network calls are the
//! only async operations.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(&config.storage_path));
//!
//! let session = SessionStore::new(storage.clone());
//! session.initialize();
//! let cart = CartStore::load(storage);
//! let api = ApiClient::from_config(&config, Arc::new(session.clone()))?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use api::{ApiClient, ApiError, Credentials};
pub use cart::CartStore;
pub use catalog::{MenuCatalog, PollHandle, RefreshOutcome};
pub use checkout::{CheckoutError, CheckoutService, DeliveryDetails, OrderType, Receipt};
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, Result};
pub use routes::{ENTRY_ROUTE, RouteDecision};
pub use session::{Authenticator, SessionError, SessionState, SessionStore, SignOutReason};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, StorageError};
