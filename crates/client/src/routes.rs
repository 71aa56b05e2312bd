//! Redirect decisions driven by the session state.

use foodpoint_core::Role;

use crate::session::SessionState;

/// Where signed-out users are sent.
pub const ENTRY_ROUTE: &str = "/auth/login";

/// Where signed-in users without access to a page are sent.
pub const HOME_ROUTE: &str = "/";

/// Outcome of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session hasn't been read yet; show a loader.
    Loading,
    /// Render the page.
    Allow,
    /// Send the user elsewhere.
    Redirect(&'static str),
}

/// Decide whether the current session may view a page restricted to
/// `allowed` roles. An empty `allowed` list admits any signed-in user.
#[must_use]
pub fn guard(state: &SessionState, allowed: &[Role]) -> RouteDecision {
    match state {
        SessionState::Loading => RouteDecision::Loading,
        SessionState::SignedOut { .. } => RouteDecision::Redirect(ENTRY_ROUTE),
        SessionState::SignedIn { role, .. } if allowed.is_empty() || allowed.contains(role) => {
            RouteDecision::Allow
        }
        SessionState::SignedIn { .. } => RouteDecision::Redirect(HOME_ROUTE),
    }
}

/// Where `/dashboard` sends the current session.
#[must_use]
pub const fn dashboard_redirect(state: &SessionState) -> RouteDecision {
    match state {
        SessionState::Loading => RouteDecision::Loading,
        SessionState::SignedOut { .. } => RouteDecision::Redirect(ENTRY_ROUTE),
        SessionState::SignedIn { role, .. } => RouteDecision::Redirect(role.landing_route()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::SignOutReason;

    fn signed_in(role: Role) -> SessionState {
        SessionState::SignedIn {
            role,
            user: serde_json::from_value(serde_json::json!({
                "id": "u1",
                "email": "a@b.com",
                "name": "Sam",
                "role": role.as_str()
            }))
            .unwrap(),
        }
    }

    #[test]
    fn test_guard() {
        let expired = SessionState::SignedOut {
            reason: SignOutReason::Expired,
        };
        assert_eq!(guard(&SessionState::Loading, &[]), RouteDecision::Loading);
        assert_eq!(guard(&expired, &[]), RouteDecision::Redirect(ENTRY_ROUTE));
        assert_eq!(
            guard(&signed_in(Role::Cashier), &[Role::Superadmin]),
            RouteDecision::Redirect(HOME_ROUTE)
        );
        assert_eq!(
            guard(&signed_in(Role::Superadmin), &[Role::Superadmin]),
            RouteDecision::Allow
        );
        assert_eq!(guard(&signed_in(Role::Guest), &[]), RouteDecision::Allow);
    }

    #[test]
    fn test_dashboard_redirect() {
        assert_eq!(
            dashboard_redirect(&signed_in(Role::Superadmin)),
            RouteDecision::Redirect("/dashboard/superadmin/details")
        );
        assert_eq!(
            dashboard_redirect(&signed_in(Role::Cashier)),
            RouteDecision::Redirect("/")
        );
        assert_eq!(
            dashboard_redirect(&SessionState::SignedOut {
                reason: SignOutReason::LoggedOut
            }),
            RouteDecision::Redirect(ENTRY_ROUTE)
        );
    }
}
