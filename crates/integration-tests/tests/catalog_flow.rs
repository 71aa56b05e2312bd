//! Menu refresh against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use secrecy::SecretString;
use serde_json::{Value, json};

use foodpoint_client::catalog::SkipReason;
use foodpoint_client::{
    ApiClient, ApiError, MemoryStorage, MenuCatalog, RefreshOutcome, SessionStore,
};
use foodpoint_core::ItemKind;
use foodpoint_integration_tests::{MockBackend, Reply, cashier_login};

fn products() -> Value {
    json!([
        {
            "_id": "p-fish",
            "productName": "Fish Butty (Med)",
            "price": 6.6,
            "quantity": 12,
            "category": "Butties",
            "dietaryInfo": { "isVegetarian": false, "isSpicy": true }
        },
        {
            "_id": "p-chips",
            "productName": "Chips",
            "price": 2.5,
            "category": "Sides"
        }
    ])
}

fn deals() -> Value {
    json!([
        {
            "_id": "d-feast",
            "dealName": "Family Feast",
            "productIds": ["p-fish", "p-chips"],
            "price": 19.99,
            "status": "active"
        }
    ])
}

async fn signed_in_catalog(backend: &MockBackend) -> (SessionStore, MenuCatalog) {
    backend.on(Method::POST, "/auth/login", Reply::json(&cashier_login("tok-3")));

    let session = SessionStore::new(Arc::new(MemoryStorage::new()));
    session.initialize();
    let api = ApiClient::new(
        backend.base_url(),
        Duration::from_secs(5),
        Arc::new(session.clone()),
    )
    .unwrap();
    session
        .login(&api, "sam@foodpoint.test", &SecretString::from("pw"))
        .await
        .unwrap();

    (session, MenuCatalog::new(api))
}

#[tokio::test]
async fn test_refresh_merges_enveloped_and_bare_lists() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(
        Method::GET,
        "/products",
        Reply::json(&json!({ "data": products() })),
    );
    backend.on(Method::GET, "/deals", Reply::json(&deals()));
    let (_session, catalog) = signed_in_catalog(&backend).await;

    let outcome = catalog.refresh().await.unwrap();
    assert!(matches!(
        outcome,
        RefreshOutcome::Refreshed {
            products: 2,
            deals: 1
        }
    ));

    let items = catalog.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].kind, ItemKind::Deal);
    assert_eq!(items[0].name, "Family Feast");
    assert!(items[1..].iter().all(|item| item.kind == ItemKind::Product));

    let snapshot = catalog.snapshot();
    assert!(snapshot.refreshed_at.is_some());
    assert!(snapshot.error.is_none());
    let categories = snapshot.categories();
    assert!(categories.contains(&"Butties".to_owned()));
    assert!(categories.contains(&"Sides".to_owned()));
    assert!(categories.contains(&"Starters".to_owned()));

    for request in backend.requests_to("/products") {
        assert_eq!(request.authorization.as_deref(), Some("Bearer tok-3"));
    }
}

#[tokio::test]
async fn test_inactive_deals_stay_off_the_menu() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::GET, "/products", Reply::json(&products()));
    backend.on(
        Method::GET,
        "/deals",
        Reply::json(&json!([
            {
                "_id": "d-feast",
                "dealName": "Family Feast",
                "price": 19.99,
                "status": "active"
            },
            {
                "_id": "d-retired",
                "dealName": "Retired Feast",
                "price": 9.99,
                "status": "inactive"
            }
        ])),
    );
    let (_session, catalog) = signed_in_catalog(&backend).await;

    catalog.refresh().await.unwrap();

    // The raw list still carries both for the deal gallery.
    assert_eq!(catalog.snapshot().deals.len(), 2);

    let items = catalog.items();
    assert_eq!(items.len(), 3);
    let offered = items
        .iter()
        .find(|item| item.id.as_str() == "d-retired" && item.kind == ItemKind::Deal);
    assert!(offered.is_none());
}

#[tokio::test]
async fn test_overlapping_refreshes_issue_one_request() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(
        Method::GET,
        "/products",
        Reply::json(&products()).delayed(Duration::from_millis(300)),
    );
    backend.on(Method::GET, "/deals", Reply::json(&deals()));
    let (_session, catalog) = signed_in_catalog(&backend).await;

    let (first, second) = tokio::join!(catalog.refresh(), catalog.refresh());

    assert!(matches!(first.unwrap(), RefreshOutcome::Refreshed { .. }));
    assert!(matches!(
        second.unwrap(),
        RefreshOutcome::Skipped(SkipReason::InFlight)
    ));
    assert_eq!(backend.requests_to("/products").len(), 1);

    // The guard is released once the first refresh finishes.
    assert!(matches!(
        catalog.refresh().await.unwrap(),
        RefreshOutcome::Refreshed { .. }
    ));
}

#[tokio::test]
async fn test_signed_out_refresh_is_skipped() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::GET, "/products", Reply::json(&products()));
    backend.on(Method::GET, "/deals", Reply::json(&deals()));
    let (session, catalog) = signed_in_catalog(&backend).await;
    session.logout();

    let outcome = catalog.refresh().await.unwrap();

    assert!(matches!(
        outcome,
        RefreshOutcome::Skipped(SkipReason::SignedOut)
    ));
    assert!(backend.requests_to("/products").is_empty());
}

#[tokio::test]
async fn test_html_page_is_reported_as_malformed() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(
        Method::GET,
        "/products",
        Reply::html("<!DOCTYPE html><html><body>Bad gateway</body></html>"),
    );
    backend.on(Method::GET, "/deals", Reply::json(&deals()));
    let (session, catalog) = signed_in_catalog(&backend).await;

    let err = catalog.refresh().await.unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse(_)));
    let snapshot = catalog.snapshot();
    assert!(snapshot.error.is_some());
    assert!(snapshot.products.is_empty());
    // A bad payload is not an auth failure.
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_polling_publishes_snapshots_until_stopped() {
    let backend = MockBackend::start().await.unwrap();
    backend.on(Method::GET, "/products", Reply::json(&products()));
    backend.on(Method::GET, "/deals", Reply::json(&deals()));
    let (_session, catalog) = signed_in_catalog(&backend).await;

    let mut rx = catalog.subscribe();
    let poller = catalog.spawn_polling(Duration::from_millis(50));

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(rx.borrow().products.len(), 2);
    assert!(backend.requests_to("/products").len() >= 2);

    poller.stop();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let seen = backend.requests_to("/products").len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.requests_to("/products").len(), seen);
}
