//! Authentication endpoints (`/auth/*`).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use foodpoint_core::{Email, Role, User};

use super::{Ack, ApiClient, ApiError};
use crate::session::Authenticator;

/// Successful `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "WireLogin")]
pub struct LoginResponse {
    pub token: SecretString,
    pub role: Role,
    pub user: User,
}

#[derive(Deserialize)]
struct WireLogin {
    token: String,
    role: Role,
    user: User,
}

impl From<WireLogin> for LoginResponse {
    fn from(wire: WireLogin) -> Self {
        Self {
            token: SecretString::from(wire.token),
            role: wire.role,
            user: wire.user,
        }
    }
}

/// `POST /auth/check-role` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CheckRoleResponse {
    pub role: Role,
}

/// `POST /auth/refresh` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "WireRefresh")]
pub struct RefreshResponse {
    pub token: SecretString,
}

#[derive(Deserialize)]
struct WireRefresh {
    token: String,
}

impl From<WireRefresh> for RefreshResponse {
    fn from(wire: WireRefresh) -> Self {
        Self {
            token: SecretString::from(wire.token),
        }
    }
}

impl ApiClient {
    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message when the
    /// credentials are rejected, or `ApiError::MalformedResponse` if the
    /// backend answers without a usable token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let response: LoginResponse = self.post("auth/login", &body).await?;

        if response.token.expose_secret().trim().is_empty() {
            return Err(ApiError::MalformedResponse(
                "login response carried an empty token".to_string(),
            ));
        }
        Ok(response)
    }

    /// Look up which role an email address belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn check_role(&self, email: &Email) -> Result<CheckRoleResponse, ApiError> {
        self.post("auth/check-role", &json!({ "email": email.as_str() }))
            .await
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forget_password(&self, email: &Email) -> Result<Ack, ApiError> {
        self.post("auth/forget-password", &json!({ "email": email.as_str() }))
            .await
    }

    /// Check that the current bearer token is still accepted.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if it isn't.
    #[instrument(skip(self))]
    pub async fn verify_session(&self) -> Result<Ack, ApiError> {
        self.get("auth/verify").await
    }

    /// Trade the current bearer token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<RefreshResponse, ApiError> {
        self.post("auth/refresh", &json!({})).await
    }

    /// Set a new password using the token from a reset email.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the token is invalid or the request fails.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &SecretString,
    ) -> Result<Ack, ApiError> {
        let path = format!("auth/reset-password/{reset_token}");
        self.post(&path, &json!({ "newPassword": new_password.expose_secret() }))
            .await
    }

    /// Check a reset token before showing the new-password form.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the token is invalid or the request fails.
    #[instrument(skip_all)]
    pub async fn verify_reset_token(&self, reset_token: &str) -> Result<Ack, ApiError> {
        self.get(&format!("auth/reset-password/verify/{reset_token}"))
            .await
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` if the old password is wrong.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<Ack, ApiError> {
        let body = json!({
            "oldPassword": old_password.expose_secret(),
            "newPassword": new_password.expose_secret(),
        });
        self.put("auth/change-password", &body).await
    }
}

impl Authenticator for ApiClient {
    async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        self.login(email, password).await
    }
}
