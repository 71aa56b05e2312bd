//! REST client for the FoodPoint backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] owns a `reqwest` client, the API base URL and an injected
//!   [`Credentials`] handle. It never reads durable storage itself.
//! - Every response is read as text and parsed into an explicit schema, so a
//!   misconfigured base URL serving an HTML page fails fast with
//!   [`ApiError::MalformedResponse`] instead of leaking missing fields.
//! - A 401 on a signed request calls [`Credentials::on_unauthorized`], which
//!   for the session store means forced logout and a redirect to the entry
//!   route.
//!
//! Endpoints are grouped by resource: [`auth`], [`cashiers`], [`menu`] and
//! [`orders`].

pub mod auth;
pub mod cashiers;
pub mod client;
pub mod menu;
pub mod orders;

pub use auth::LoginResponse;
pub use client::ApiClient;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// A request path could not be joined onto the base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the session's credentials. The session has
    /// already been cleared when this is returned.
    #[error("session expired, please sign in again")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The backend's `message` field, or a summary of the body.
        message: String,
    },

    /// The body was not the JSON document the endpoint promises.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// HTTP status the backend answered with, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }
}

/// Request-signing seam between the API client and whoever owns the session.
///
/// Implemented by [`SessionStore`](crate::session::SessionStore).
pub trait Credentials: Send + Sync {
    /// Bearer token to attach to the next request, if any.
    fn bearer_token(&self) -> Option<SecretString>;

    /// Called when a signed request comes back 401.
    fn on_unauthorized(&self);
}

/// Credentials for calls made without a session (login, password reset).
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Credentials for Anonymous {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }

    fn on_unauthorized(&self) {}
}

/// Bare acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body that may or may not be wrapped in a `{ "data": ... }`
/// envelope. Both shapes are served by the backend.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Enveloped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Enveloped<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let bare: Enveloped<Vec<u32>> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_inner(), vec![1, 2]);

        let wrapped: Enveloped<Vec<u32>> = serde_json::from_str(r#"{"data": [3]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![3]);

        let wrong: Result<Enveloped<Vec<u32>>, _> = serde_json::from_str(r#"{"items": []}"#);
        assert!(wrong.is_err());
    }

    #[test]
    fn test_error_display_carries_backend_message() {
        let err = ApiError::Status {
            status: 400,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid credentials (HTTP 400)");
        assert_eq!(err.status(), Some(400));
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
    }

    #[test]
    fn test_ack_tolerates_missing_message() {
        let ack: Ack = serde_json::from_str("{}").unwrap();
        assert_eq!(ack.message, None);
    }
}
