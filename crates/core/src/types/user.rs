//! User profile returned by the backend.

use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// Profile of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
}
