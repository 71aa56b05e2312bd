//! Sign-in, request signing and forced logout against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::json;

use foodpoint_client::routes::guard;
use foodpoint_client::storage::keys;
use foodpoint_client::{
    ApiClient, ApiError, DurableStorage, ENTRY_ROUTE, FileStorage, RouteDecision, SessionError,
    SessionState, SessionStore, SignOutReason,
};
use foodpoint_core::Role;
use foodpoint_integration_tests::{MockBackend, Reply, cashier_login};

const TIMEOUT: Duration = Duration::from_secs(5);

fn password() -> SecretString {
    SecretString::from("correct horse")
}

fn connect(backend: &MockBackend, session: &SessionStore) -> ApiClient {
    ApiClient::new(backend.base_url(), TIMEOUT, Arc::new(session.clone())).unwrap()
}

#[tokio::test]
async fn test_login_signs_later_requests_and_survives_restart() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::POST, "/auth/login", Reply::json(&cashier_login("tok-1")));
    backend.on(Method::GET, "/orders", Reply::json(&json!([])));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foodpoint.json");

    let session = SessionStore::new(Arc::new(FileStorage::new(&path)));
    assert!(matches!(
        session.initialize(),
        SessionState::SignedOut {
            reason: SignOutReason::NoSession
        }
    ));
    let api = connect(&backend, &session);
    assert!(!api.has_credentials());

    let (role, user) = session
        .login(&api, "  sam@foodpoint.test ", &password())
        .await
        .unwrap();
    assert_eq!(role, Role::Cashier);
    assert_eq!(user.name, "Sam");

    let login = backend.requests_to("/auth/login");
    assert_eq!(login.len(), 1);
    assert!(login[0].authorization.is_none());
    assert_eq!(login[0].body["email"], "sam@foodpoint.test");
    assert_eq!(login[0].body["password"], "correct horse");

    api.list_orders().await.unwrap();
    let orders = backend.requests_to("/orders");
    assert_eq!(orders[0].authorization.as_deref(), Some("Bearer tok-1"));

    // A second process reading the same file starts signed in.
    let restarted = SessionStore::new(Arc::new(FileStorage::new(&path)));
    match restarted.initialize() {
        SessionState::SignedIn { role, user } => {
            assert_eq!(role, Role::Cashier);
            assert_eq!(user.email.as_str(), "sam@foodpoint.test");
        }
        other => panic!("expected a restored session, got {other:?}"),
    }
    assert_eq!(
        guard(&restarted.state(), &[Role::Cashier]),
        RouteDecision::Allow
    );
}

#[tokio::test]
async fn test_rejected_credentials_leave_nothing_behind() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(
        Method::POST,
        "/auth/login",
        Reply::status(
            StatusCode::UNAUTHORIZED,
            &json!({ "message": "Invalid email or password" }),
        ),
    );

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("foodpoint.json")));
    let session = SessionStore::new(storage.clone());
    session.initialize();
    let api = connect(&backend, &session);

    let err = session
        .login(&api, "sam@foodpoint.test", &password())
        .await
        .unwrap_err();

    match err {
        SessionError::Api(ApiError::Status { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!session.is_authenticated());
    for key in keys::SESSION {
        assert_eq!(storage.get(key).unwrap(), None);
    }
}

#[tokio::test]
async fn test_invalid_email_never_reaches_the_backend() {
    let backend = MockBackend::start().await.unwrap();
    let session = SessionStore::new(Arc::new(foodpoint_client::MemoryStorage::new()));
    session.initialize();
    let api = connect(&backend, &session);

    let err = session
        .login(&api, "not-an-email", &password())
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::InvalidEmail(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_token_forces_logout() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::POST, "/auth/login", Reply::json(&cashier_login("tok-1")));

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("foodpoint.json")));
    let session = SessionStore::new(storage.clone());
    session.initialize();
    let api = connect(&backend, &session);
    session
        .login(&api, "sam@foodpoint.test", &password())
        .await
        .unwrap();

    let mut rx = session.subscribe();
    rx.mark_unchanged();

    backend.on(
        Method::GET,
        "/orders",
        Reply::status(StatusCode::UNAUTHORIZED, &json!({ "message": "jwt expired" })),
    );
    let err = api.list_orders().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    assert!(rx.has_changed().unwrap());
    assert!(matches!(
        session.state(),
        SessionState::SignedOut {
            reason: SignOutReason::Expired
        }
    ));
    assert_eq!(
        guard(&session.state(), &[]),
        RouteDecision::Redirect(ENTRY_ROUTE)
    );
    assert!(!api.has_credentials());
    for key in keys::SESSION {
        assert_eq!(storage.get(key).unwrap(), None);
    }
}

#[tokio::test]
async fn test_rate_limit_keeps_session() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::POST, "/auth/login", Reply::json(&cashier_login("tok-1")));
    backend.on(
        Method::GET,
        "/orders",
        Reply::status(
            StatusCode::TOO_MANY_REQUESTS,
            &json!({ "message": "slow down" }),
        ),
    );

    let session = SessionStore::new(Arc::new(foodpoint_client::MemoryStorage::new()));
    session.initialize();
    let api = connect(&backend, &session);
    session
        .login(&api, "sam@foodpoint.test", &password())
        .await
        .unwrap();

    let err = api.list_orders().await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(60)));
    assert!(session.is_authenticated());
}
