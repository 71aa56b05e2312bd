//! Integration tests for the FoodPoint client.
//!
//! Each test starts a [`MockBackend`] on an ephemeral port, points an
//! `ApiClient` at it and drives the stores end to end. No external services
//! are needed:
//!
//! ```bash
//! cargo test -p foodpoint-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - Sign-in, request signing, forced logout, restarts
//! - `checkout_flow` - Cart to order payload
//! - `catalog_flow` - Menu refresh, envelopes, single-flight, polling
//! - `menu_admin` - Product, deal and option management endpoints
//! - `staff_admin` - Cashier management and account endpoints

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Canned response for one route.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl Reply {
    /// `200 OK` with a JSON body.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self::status(StatusCode::OK, body)
    }

    /// Any status with a JSON body.
    #[must_use]
    pub fn status(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// `200 OK` with an HTML page, as served by a misrouted proxy.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the response back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request the backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path below the `/api` prefix, e.g. `/orders`.
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Parsed JSON body; `Value::Null` when there was none or it wasn't JSON.
    pub body: Value,
    /// Body as text, for multipart uploads.
    pub raw: String,
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the FoodPoint REST backend.
///
/// Routes are registered with [`on`](Self::on); anything unregistered gets
/// a `404` with a JSON message. The server stops when the value is dropped.
pub struct MockBackend {
    shared: Arc<Shared>,
    base_url: Url,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener can't be bound.
    pub async fn start() -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(respond).with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/api/")).map_err(io::Error::other)?;

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            shared,
            base_url,
            task,
        })
    }

    /// Base URL to hand to `ApiClient::new`.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Answer `method path` with `reply`, replacing any earlier reply.
    pub fn on(&self, method: Method, path: &str, reply: Reply) {
        lock(&self.shared.routes).insert((method, path.to_owned()), reply);
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.shared.requests).clone()
    }

    /// Requests received for `path`, any method.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or_else(|| uri.path())
        .to_owned();

    let header_text = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    lock(&shared.requests).push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        raw: String::from_utf8_lossy(&body).into_owned(),
    });

    let reply = lock(&shared.routes).get(&(method, path)).cloned();
    let Some(reply) = reply else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            json!({ "message": "Route not found" }).to_string(),
        )
            .into_response();
    };

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
        .into_response()
}

/// Login response for a cashier named Sam holding `token`.
#[must_use]
pub fn cashier_login(token: &str) -> Value {
    json!({
        "token": token,
        "role": "cashier",
        "user": {
            "_id": "u-cashier-1",
            "email": "sam@foodpoint.test",
            "name": "Sam",
            "role": "cashier"
        }
    })
}
