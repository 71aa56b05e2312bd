//! Durable key-value storage.
//!
//! The session and cart stores persist through [`DurableStorage`], a small
//! synchronous string-to-string store. Reads are cheap and never touch the
//! network, which is what lets the session store answer `token()` from
//! inside a request interceptor.
//!
//! # Key namespaces
//!
//! - Session: [`keys::TOKEN`], [`keys::ROLE`], [`keys::USER`]
//! - Cart: [`keys::CART`]
//!
//! The two namespaces are disjoint, so the stores never contend for a key.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded.
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A writer panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Process-wide, keyed, string-valued store that survives restarts.
pub trait DurableStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage keys.
pub mod keys {
    /// Bearer token of the signed-in user.
    pub const TOKEN: &str = "token";

    /// Role tag of the signed-in user.
    pub const ROLE: &str = "role";

    /// JSON-encoded profile of the signed-in user.
    pub const USER: &str = "user";

    /// JSON-encoded cart (`{items, total}`).
    pub const CART: &str = "foodpoint_cart";

    /// Every key owned by the session store.
    pub const SESSION: [&str; 3] = [TOKEN, ROLE, USER];
}
