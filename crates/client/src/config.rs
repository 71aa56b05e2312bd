//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODPOINT_API_URL` - Base URL of the REST backend (e.g. `http://localhost:5000/api`)
//!
//! ## Optional
//! - `FOODPOINT_STORAGE_PATH` - Durable storage file (default: `.foodpoint/storage.json`)
//! - `FOODPOINT_REFRESH_INTERVAL_SECS` - Menu polling interval (default: 5, minimum 1)
//! - `FOODPOINT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_PATH: &str = ".foodpoint/storage.json";
const DEFAULT_REFRESH_INTERVAL_SECS: &str = "5";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// FoodPoint client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, always ending in `/`
    pub api_url: Url,
    /// File backing durable storage
    pub storage_path: PathBuf,
    /// Menu polling interval
    pub refresh_interval: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Sentry DSN (contains a key)
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("storage_path", &self.storage_path)
            .field("refresh_interval", &self.refresh_interval)
            .field("request_timeout", &self.request_timeout)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let api_url = env.required("FOODPOINT_API_URL")?;
        let mut api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FOODPOINT_API_URL".to_string(), e.to_string())
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "FOODPOINT_API_URL".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let storage_path =
            PathBuf::from(env.or_default("FOODPOINT_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        let refresh_secs = env.secs(
            "FOODPOINT_REFRESH_INTERVAL_SECS",
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        if refresh_secs < 1 {
            return Err(ConfigError::InvalidEnvVar(
                "FOODPOINT_REFRESH_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let timeout_secs =
            env.secs("FOODPOINT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            storage_path,
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: env.optional("SENTRY_DSN").map(SecretString::from),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn secs(&self, key: &str, default: &str) -> Result<u64, ConfigError> {
        self.or_default(key, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("FOODPOINT_API_URL", "http://localhost:5000/api")]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(config.storage_path, PathBuf::from(".foodpoint/storage.json"));
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "FOODPOINT_API_URL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("FOODPOINT_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[
                ("FOODPOINT_API_URL", "http://localhost:5000/"),
                ("FOODPOINT_REFRESH_INTERVAL_SECS", "0"),
            ]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[
                ("FOODPOINT_API_URL", "http://localhost:5000/"),
                ("FOODPOINT_REQUEST_TIMEOUT_SECS", "soon"),
            ]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let config = load(&[
            ("FOODPOINT_API_URL", "https://api.foodpoint.test"),
            ("SENTRY_DSN", "https://abc123@o1.ingest.sentry.io/42"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
