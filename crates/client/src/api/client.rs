//! HTTP plumbing shared by every endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::{ApiError, Credentials, Enveloped};
use crate::config::ClientConfig;

/// Default `Retry-After` when a 429 doesn't say.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Characters of a body kept in logs and error messages.
const BODY_PREVIEW_CHARS: usize = 500;

enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Form),
}

/// FoodPoint REST API client.
///
/// Cheap to clone; clones share the connection pool and credentials.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn Credentials>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        credentials: Arc<dyn Credentials>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: with_trailing_slash(base_url),
                credentials,
            }),
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn from_config(
        config: &ClientConfig,
        credentials: Arc<dyn Credentials>,
    ) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.request_timeout, credentials)
    }

    /// Base URL every request path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether the next request would carry a bearer token.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.inner.credentials.bearer_token().is_some()
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body: Enveloped<T> = self.send(Method::GET, path, RequestBody::Empty).await?;
        Ok(body.into_inner())
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, RequestBody::Json(encode(body)?))
            .await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, RequestBody::Json(encode(body)?))
            .await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, RequestBody::Json(encode(body)?))
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, RequestBody::Empty).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, RequestBody::Form(form)).await
    }

    /// Issue a request and decode the response.
    ///
    /// # Errors
    ///
    /// - `ApiError::Unauthorized` if a signed request is rejected with 401
    ///   (credentials have been told)
    /// - `ApiError::RateLimited` on 429
    /// - `ApiError::Status` on any other non-success status
    /// - `ApiError::MalformedResponse` if the body isn't the expected JSON
    /// - `ApiError::Http` on network failures
    #[instrument(skip(self, method, body), fields(method = %method))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        let mut request = self.inner.http.request(method, url);

        let token = self.inner.credentials.bearer_token();
        let signed = token.is_some();
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(body) => request.json(&body),
            RequestBody::Form(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, signed, "Backend responded");

        // Unsigned requests (login, password reset) get their 401 back as an
        // ordinary status so the caller can show the backend's message.
        if status == StatusCode::UNAUTHORIZED && signed {
            warn!("Backend rejected session credentials");
            self.inner.credentials.on_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %preview(&text),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        decode(&text)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub(crate) fn encode<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    Ok(serde_json::to_value(body)?)
}

/// Parse a success body into `T`.
pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if looks_like_html(text) {
        error!(body = %preview(text), "Backend served HTML instead of JSON");
        return Err(ApiError::MalformedResponse(
            "received an HTML page instead of JSON, check FOODPOINT_API_URL".to_string(),
        ));
    }

    // 204s and empty acknowledgements decode as an empty object.
    let text = if text.trim().is_empty() { "{}" } else { text };

    serde_json::from_str(text).map_err(|e| {
        error!(error = %e, body = %preview(text), "Failed to parse backend response");
        ApiError::MalformedResponse(e.to_string())
    })
}

fn looks_like_html(text: &str) -> bool {
    let head = text.trim_start();
    let lower: String = head.chars().take(15).collect::<String>().to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}

/// Human-readable message for a failed request.
fn error_message(status: StatusCode, text: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    };

    if looks_like_html(text) || text.trim().is_empty() {
        return fallback();
    }

    match serde_json::from_str::<ErrorBody>(text) {
        Ok(
            ErrorBody {
                message: Some(message),
                ..
            }
            | ErrorBody {
                error: Some(message),
                ..
            },
        ) => message,
        Ok(_) => fallback(),
        Err(_) => text.chars().take(200).collect(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Ack;

    #[test]
    fn test_trailing_slash_is_added_once() {
        let url = with_trailing_slash(Url::parse("http://localhost:5000/api").unwrap());
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("auth/login").unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );

        let url = with_trailing_slash(Url::parse("http://localhost:5000/api/").unwrap());
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
    }

    #[test]
    fn test_html_body_is_malformed() {
        let result: Result<Ack, _> = decode("<!DOCTYPE html><html><body>ngrok</body></html>");
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));

        let result: Result<Ack, _> = decode("  <html lang=\"en\">");
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[test]
    fn test_schema_mismatch_is_malformed() {
        let result: Result<Vec<u32>, _> = decode(r#"{"oops": true}"#);
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[test]
    fn test_unencodable_body_is_an_encode_error() {
        let mut body = std::collections::BTreeMap::new();
        body.insert(vec![1_u8, 2], "pair keys aren't JSON object keys");

        let err = encode(&body).unwrap_err();
        assert!(matches!(err, ApiError::Encode(_)));
        assert!(err.to_string().starts_with("failed to encode request body"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_empty_body_decodes_as_ack() {
        let ack: Ack = decode("").unwrap();
        assert_eq!(ack, Ack::default());
    }

    #[test]
    fn test_error_message_prefers_backend_message() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message": "Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"error": "Email already exists"}"#),
            "Email already exists"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "<!DOCTYPE html>"),
            "Not Found"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "{}"),
            "Internal Server Error"
        );
    }
}
