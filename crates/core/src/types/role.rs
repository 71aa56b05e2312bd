//! Roles controlling which views and actions are available.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a role tag is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct UnknownRole(pub String);

/// Closed set of role tags issued by the backend at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages products, deals, option groups, cashiers and orders.
    Superadmin,
    /// Takes walk-in orders at the till.
    Cashier,
    /// Browses the menu and builds a cart.
    Guest,
}

impl Role {
    /// Wire tag for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Cashier => "cashier",
            Self::Guest => "guest",
        }
    }

    /// Route a freshly signed-in user lands on.
    #[must_use]
    pub const fn landing_route(&self) -> &'static str {
        match self {
            Self::Superadmin => "/dashboard/superadmin/details",
            Self::Cashier | Self::Guest => "/",
        }
    }

    /// Whether this role may manage the catalog and staff accounts.
    #[must_use]
    pub const fn is_staff_admin(&self) -> bool {
        matches!(self, Self::Superadmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Self::Superadmin),
            "cashier" => Ok(Self::Cashier),
            "guest" => Ok(Self::Guest),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for role in [Role::Superadmin, Role::Cashier, Role::Guest] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        let err = "manager".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "invalid role: manager");
    }

    #[test]
    fn test_landing_routes() {
        assert_eq!(Role::Superadmin.landing_route(), "/dashboard/superadmin/details");
        assert_eq!(Role::Cashier.landing_route(), "/");
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"cashier\"");
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert_eq!(role, Role::Superadmin);
    }
}
