//! Read-only views of the stored session record.
//!
//! These never write. They exist for collaborators that need the stored
//! values without going through a [`SessionStore`](super::SessionStore),
//! and for the store's own cache-miss fallback. Unreadable, empty or
//! unparseable values count as absent.

use secrecy::SecretString;
use tracing::warn;

use foodpoint_core::{Role, User};

use crate::storage::{DurableStorage, keys};

/// The three stored session values, each possibly absent.
#[derive(Debug, Default)]
pub struct StoredRecord {
    pub token: Option<SecretString>,
    pub role: Option<Role>,
    pub user: Option<User>,
}

impl StoredRecord {
    /// None of the three values is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none() && self.role.is_none() && self.user.is_none()
    }

    /// All three values are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.token.is_some() && self.role.is_some() && self.user.is_some()
    }

    /// The three values, if all are present.
    #[must_use]
    pub fn complete(&self) -> Option<(SecretString, Role, User)> {
        match (&self.token, self.role, &self.user) {
            (Some(token), Some(role), Some(user)) => Some((token.clone(), role, user.clone())),
            _ => None,
        }
    }
}

/// Read every session key.
pub fn stored_record(storage: &dyn DurableStorage) -> StoredRecord {
    StoredRecord {
        token: stored_token(storage),
        role: stored_role(storage),
        user: stored_user(storage),
    }
}

/// Stored bearer token.
pub fn stored_token(storage: &dyn DurableStorage) -> Option<SecretString> {
    read(storage, keys::TOKEN).map(SecretString::from)
}

/// Stored role.
pub fn stored_role(storage: &dyn DurableStorage) -> Option<Role> {
    let raw = read(storage, keys::ROLE)?;
    match raw.parse() {
        Ok(role) => Some(role),
        Err(e) => {
            warn!(error = %e, "Ignoring stored role");
            None
        }
    }
}

/// Stored user profile.
pub fn stored_user(storage: &dyn DurableStorage) -> Option<User> {
    let raw = read(storage, keys::USER)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable stored user");
            None
        }
    }
}

fn read(storage: &dyn DurableStorage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            warn!(key, error = %e, "Failed to read session key");
            None
        }
    }
}
