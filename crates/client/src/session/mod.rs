//! Session store: who is signed in.
//!
//! [`SessionStore`] owns the bearer token, role and user profile. It keeps
//! an in-memory copy for synchronous reads (request signing, redirect
//! decisions) and mirrors every change to [`DurableStorage`] so a restart
//! picks up where the last process left off.
//!
//! # The all-or-nothing record
//!
//! Token, role and user are written together and cleared together. A stored
//! record holding only some of them (a crash between writes, a hand-edited
//! file) is treated as corrupt: [`SessionStore::initialize`] clears it and
//! starts signed out. This is a silent repair, logged at `warn`, never an
//! error.
//!
//! # Reactive state
//!
//! Views subscribe to a `tokio::sync::watch` channel of [`SessionState`].
//! The store starts in [`SessionState::Loading`] and leaves it only once
//! `initialize` has run.

mod record;

pub use record::{StoredRecord, stored_record, stored_role, stored_token, stored_user};

use std::future::Future;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use foodpoint_core::{Email, EmailError, Role, User};

use crate::api::{ApiError, Credentials, LoginResponse};
use crate::routes::ENTRY_ROUTE;
use crate::storage::{DurableStorage, StorageError, keys};
use crate::telemetry;

/// Errors surfaced by [`SessionStore`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The email was rejected before contacting the backend.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend refused the login; the message is the backend's own.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be written to durable storage.
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),

    /// The user profile could not be encoded for storage.
    #[error("failed to encode user profile: {0}")]
    Encode(#[from] serde_json::Error),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}

/// Why the store is signed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// Nothing was stored.
    NoSession,
    /// The user logged out.
    LoggedOut,
    /// The backend rejected the session's token.
    Expired,
    /// A partial stored record was found and cleared.
    Repaired,
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Durable storage hasn't been read yet.
    Loading,
    SignedOut {
        reason: SignOutReason,
    },
    SignedIn {
        role: Role,
        user: User,
    },
}

impl SessionState {
    /// Role of the signed-in user, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::SignedIn { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// Backend seam for [`SessionStore::login`].
///
/// Implemented by [`ApiClient`](crate::api::ApiClient).
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a session.
    fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;
}

/// Single source of truth for the signed-in user.
///
/// Cheap to clone; clones share the cache, storage and state channel.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn DurableStorage>,
    cache: RwLock<Option<CachedSession>>,
    state: watch::Sender<SessionState>,
    initialized: OnceLock<()>,
}

struct CachedSession {
    token: SecretString,
    role: Role,
    user: User,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.inner.state.borrow())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store over `storage`. Call [`initialize`](Self::initialize)
    /// before relying on [`state`](Self::state).
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                cache: RwLock::new(None),
                state,
                initialized: OnceLock::new(),
            }),
        }
    }

    /// Repair and rehydrate from durable storage, once.
    ///
    /// Later calls return the current state without touching storage.
    pub fn initialize(&self) -> SessionState {
        self.inner.initialized.get_or_init(|| {
            self.refresh_from_storage();
        });
        self.state()
    }

    /// Re-read durable storage, repairing a partial record.
    ///
    /// Picks up a login or logout made by another process sharing the
    /// same storage.
    #[instrument(skip(self))]
    pub fn refresh_from_storage(&self) -> SessionState {
        let storage = self.inner.storage.as_ref();
        let record = stored_record(storage);
        let mut cache = self.write_cache();

        let state = if record.is_empty() {
            *cache = None;
            SessionState::SignedOut {
                reason: SignOutReason::NoSession,
            }
        } else if let Some((token, role, user)) = record.complete() {
            telemetry::set_sentry_user(&user);
            *cache = Some(CachedSession {
                token,
                role,
                user: user.clone(),
            });
            SessionState::SignedIn { role, user }
        } else {
            warn!(
                has_token = record.token.is_some(),
                has_role = record.role.is_some(),
                has_user = record.user.is_some(),
                "Partial session record in storage, clearing it"
            );
            *cache = None;
            clear_session_keys(storage);
            SessionState::SignedOut {
                reason: SignOutReason::Repaired,
            }
        };

        drop(cache);
        self.inner.state.send_replace(state.clone());
        state
    }

    /// Sign in with email and password.
    ///
    /// On success token, role and user are written to storage and cache
    /// together and the state flips to `SignedIn`. On failure nothing is
    /// written and the backend's error is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidEmail` if `email` doesn't parse (no request is made)
    /// - `SessionError::Api` if the backend refuses the credentials
    /// - `SessionError::Storage` if the session can't be persisted; the
    ///   store is left signed out
    #[instrument(skip(self, authenticator, password), fields(email = %email))]
    pub async fn login(
        &self,
        authenticator: &impl Authenticator,
        email: &str,
        password: &SecretString,
    ) -> Result<(Role, User), SessionError> {
        let email = Email::parse(email)?;
        let LoginResponse { token, role, user } =
            authenticator.authenticate(&email, password).await?;

        let encoded_user = serde_json::to_string(&user)?;
        let storage = self.inner.storage.as_ref();
        let mut cache = self.write_cache();

        let written = storage
            .set(keys::TOKEN, token.expose_secret())
            .and_then(|()| storage.set(keys::ROLE, role.as_str()))
            .and_then(|()| storage.set(keys::USER, &encoded_user));

        if let Err(e) = written {
            error!(error = %e, "Failed to persist session, signing out");
            *cache = None;
            clear_session_keys(storage);
            drop(cache);
            self.inner.state.send_replace(SessionState::SignedOut {
                reason: SignOutReason::LoggedOut,
            });
            return Err(e.into());
        }

        *cache = Some(CachedSession {
            token,
            role,
            user: user.clone(),
        });
        drop(cache);

        telemetry::set_sentry_user(&user);
        telemetry::add_breadcrumb("auth", "Signed in", Some(&[("role", role.as_str())]));
        info!(user_id = %user.id, role = %role, "Signed in");

        self.inner.state.send_replace(SessionState::SignedIn {
            role,
            user: user.clone(),
        });
        Ok((role, user))
    }

    /// Sign out: clear storage, cache and state. Never fails.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.sign_out(SignOutReason::LoggedOut);
        info!("Signed out");
    }

    /// Forced logout after the backend rejected the token.
    ///
    /// Views observing the state redirect to [`ENTRY_ROUTE`].
    #[instrument(skip(self))]
    pub fn expire(&self) {
        self.sign_out(SignOutReason::Expired);
        warn!(redirect = ENTRY_ROUTE, "Session expired");
    }

    fn sign_out(&self, reason: SignOutReason) {
        let mut cache = self.write_cache();
        *cache = None;
        clear_session_keys(self.inner.storage.as_ref());
        drop(cache);

        telemetry::clear_sentry_user();
        self.inner
            .state
            .send_replace(SessionState::SignedOut { reason });
    }

    /// Bearer token: the cached one, else a fresh read of storage.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        if let Some(session) = self.read_cache().as_ref() {
            return Some(session.token.clone());
        }
        stored_token(self.inner.storage.as_ref())
    }

    /// Whether a token is available (cache, then storage).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Role of the signed-in user (cache, then storage).
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        if let Some(session) = self.read_cache().as_ref() {
            return Some(session.role);
        }
        stored_role(self.inner.storage.as_ref())
    }

    /// Profile of the signed-in user (cache, then storage).
    #[must_use]
    pub fn user(&self) -> Option<User> {
        if let Some(session) = self.read_cache().as_ref() {
            return Some(session.user.clone());
        }
        stored_user(self.inner.storage.as_ref())
    }

    /// Replace the profile, leaving token and role alone.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotSignedIn` if there is no session to update
    /// - `SessionError::Storage` if the profile can't be persisted; the
    ///   cached profile is left unchanged
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub fn update_user(&self, user: User) -> Result<(), SessionError> {
        let mut cache = self.write_cache();
        let Some(session) = cache.as_mut() else {
            return Err(SessionError::NotSignedIn);
        };

        let encoded = serde_json::to_string(&user)?;
        self.inner.storage.set(keys::USER, &encoded)?;
        session.user = user.clone();
        let role = session.role;
        drop(cache);

        self.inner
            .state
            .send_replace(SessionState::SignedIn { role, user });
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Option<CachedSession>> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Option<CachedSession>> {
        self.inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Credentials for SessionStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.token()
    }

    fn on_unauthorized(&self) {
        self.expire();
    }
}

fn clear_session_keys(storage: &dyn DurableStorage) {
    for key in keys::SESSION {
        if let Err(e) = storage.remove(key) {
            error!(key, error = %e, "Failed to clear session key");
        }
    }
}
