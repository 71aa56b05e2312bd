//! Error type spanning every client operation.
//!
//! Each module has its own error enum; [`Error`] wraps them so front ends
//! (the CLI, an embedding UI) can propagate anything with `?`.

use foodpoint_core::CartError;
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Any client error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

impl Error {
    /// Whether the user has to sign in again to continue.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Unauthorized)
                | Self::Session(SessionError::Api(ApiError::Unauthorized) | SessionError::NotSignedIn)
                | Self::Checkout(CheckoutError::Api(ApiError::Unauthorized))
        )
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
