//! Cashier management endpoints (superadmin only).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use foodpoint_core::{Email, Role, UserId};

use super::{Ack, ApiClient, ApiError};

/// A cashier account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cashier {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub role: Option<Role>,
}

/// A cashier account to create.
#[derive(Debug, Clone)]
pub struct NewCashier {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
}

/// Changes to an existing cashier. The password is only sent when set.
#[derive(Debug, Clone)]
pub struct CashierUpdate {
    pub name: String,
    pub email: Email,
    pub password: Option<SecretString>,
}

/// `POST /auth/create-multiple-cashiers` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashiersResponse {
    #[serde(default)]
    pub message: String,
    /// Addresses the backend refused, typically because they already exist.
    #[serde(default)]
    pub failed_emails: Vec<String>,
}

impl ApiClient {
    /// List every cashier account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_cashiers(&self) -> Result<Vec<Cashier>, ApiError> {
        self.get("auth/cashiers").await
    }

    /// Fetch one cashier.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 if the cashier doesn't exist.
    #[instrument(skip(self), fields(cashier_id = %id))]
    pub async fn get_cashier(&self, id: &UserId) -> Result<Cashier, ApiError> {
        self.get(&format!("auth/cashiers/{id}")).await
    }

    /// Update a cashier's name, email and optionally password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, update), fields(cashier_id = %id))]
    pub async fn update_cashier(&self, id: &UserId, update: &CashierUpdate) -> Result<Ack, ApiError> {
        let mut body = json!({
            "name": update.name,
            "email": update.email.as_str(),
        });
        if let (Some(password), Some(fields)) = (&update.password, body.as_object_mut()) {
            fields.insert(
                "password".to_string(),
                password.expose_secret().to_string().into(),
            );
        }
        self.put(&format!("auth/cashiers/{id}"), &body).await
    }

    /// Delete a cashier account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(cashier_id = %id))]
    pub async fn delete_cashier(&self, id: &UserId) -> Result<Ack, ApiError> {
        self.delete(&format!("auth/cashiers/{id}")).await
    }

    /// Create several cashier accounts in one call.
    ///
    /// Partial success is normal: refused addresses come back in
    /// `failed_emails` rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request as a whole fails.
    #[instrument(skip(self, cashiers), fields(count = cashiers.len()))]
    pub async fn create_cashiers(
        &self,
        cashiers: &[NewCashier],
    ) -> Result<CreateCashiersResponse, ApiError> {
        let cashiers: Vec<_> = cashiers
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "email": c.email.as_str(),
                    "password": c.password.expose_secret(),
                })
            })
            .collect();
        self.post("auth/create-multiple-cashiers", &json!({ "cashiers": cashiers }))
            .await
    }
}
