//! Route decision logic for role-gated views.
//!
//! # Responsibilities
//! - Turn (auth state, allowed roles, current location) into a decision
//! - Resolve the landing page for a role that may not enter a route
//!
//! # Design Decisions
//! - Pure function of its inputs; navigation happens elsewhere
//! - A loading auth state never produces a redirect
//! - Unauthenticated always wins over role checks

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::GuardConfig;
use crate::guard::role::Role;

/// Authentication state as exposed by the client's auth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthState {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(role: Role) -> Self {
        Self {
            authenticated: true,
            role: Some(role),
            loading: false,
        }
    }
}

/// The navigation target the user was trying to reach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
}

impl Location {
    /// Split a `path?query#fragment` string into its parts.
    pub fn parse(target: &str) -> Self {
        let (rest, hash) = match target.find('#') {
            Some(idx) => (&target[..idx], &target[idx..]),
            None => (target, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        Self {
            pathname: if pathname.is_empty() { "/".to_string() } else { pathname.to_string() },
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Outcome of evaluating a guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Auth state is still loading; show a neutral placeholder.
    Pending,
    /// The user may see the protected content.
    Render,
    /// Send the user to the login page, remembering where they were going.
    RedirectToLogin(Location),
    /// Send the user to another page (their role's home).
    RedirectTo(String),
}

/// A protected client route and the roles allowed to enter it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectedRoute {
    pub path: String,
    pub allowed_roles: Vec<Role>,
}

impl ProtectedRoute {
    pub fn new(path: impl Into<String>, allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            path: path.into(),
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// Whether `path` falls under this route (the route itself or a sub-path).
    pub fn covers(&self, path: &str) -> bool {
        let prefix = self.path.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Static role-to-landing-page table plus the login and fallback paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHomes {
    login_path: String,
    default_home: String,
    homes: BTreeMap<Role, String>,
}

impl RoleHomes {
    pub fn new(
        login_path: impl Into<String>,
        default_home: impl Into<String>,
        homes: BTreeMap<Role, String>,
    ) -> Self {
        Self {
            login_path: login_path.into(),
            default_home: default_home.into(),
            homes,
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(
            config.login_path.clone(),
            config.default_home.clone(),
            config.role_homes.clone(),
        )
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn default_home(&self) -> &str {
        &self.default_home
    }

    /// Landing page for `role`, or the default home when the role has none.
    pub fn home_for(&self, role: Option<Role>) -> &str {
        role.and_then(|r| self.homes.get(&r))
            .map(String::as_str)
            .unwrap_or(self.default_home.as_str())
    }
}

impl Default for RoleHomes {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

/// Decides what a protected view should do for the current auth state.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    allowed_roles: BTreeSet<Role>,
    homes: RoleHomes,
}

impl RouteGuard {
    pub fn new(allowed_roles: impl IntoIterator<Item = Role>, homes: RoleHomes) -> Self {
        let allowed_roles: BTreeSet<Role> = allowed_roles.into_iter().collect();
        if allowed_roles.is_empty() {
            tracing::warn!("Route guard created with no allowed roles; nothing will render");
        }
        Self { allowed_roles, homes }
    }

    pub fn allowed_roles(&self) -> &BTreeSet<Role> {
        &self.allowed_roles
    }

    pub fn homes(&self) -> &RoleHomes {
        &self.homes
    }

    pub fn decide(&self, auth: &AuthState, location: &Location) -> RouteDecision {
        if auth.loading {
            return RouteDecision::Pending;
        }
        if !auth.authenticated {
            return RouteDecision::RedirectToLogin(location.clone());
        }
        match auth.role {
            Some(role) if self.allowed_roles.contains(&role) => RouteDecision::Render,
            role => {
                tracing::debug!(
                    role = ?role,
                    location = %location,
                    "Role not allowed on route, redirecting to role home"
                );
                RouteDecision::RedirectTo(self.homes.home_for(role).to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn homes() -> RoleHomes {
        let mut table = BTreeMap::new();
        table.insert(Role::Trainer, "/trainer".to_string());
        table.insert(Role::Admin, "/admin".to_string());
        RoleHomes::new("/login", "/", table)
    }

    fn meals() -> Location {
        Location::parse("/meals?day=mon#lunch")
    }

    #[test]
    fn test_loading_is_pending_for_any_roles() {
        for allowed in [vec![Role::Admin], vec![Role::User, Role::Trainer]] {
            let guard = RouteGuard::new(allowed, homes());
            let decision = guard.decide(&AuthState::loading(), &meals());
            assert_eq!(decision, RouteDecision::Pending);
        }
    }

    #[test]
    fn test_loading_wins_even_when_authenticated() {
        let guard = RouteGuard::new([Role::Admin], homes());
        let auth = AuthState {
            authenticated: true,
            role: Some(Role::Trainer),
            loading: true,
        };
        assert_eq!(guard.decide(&auth, &meals()), RouteDecision::Pending);
    }

    #[test]
    fn test_unauthenticated_goes_to_login_with_location() {
        let guard = RouteGuard::new([Role::User], homes());
        let auth = AuthState {
            authenticated: false,
            role: Some(Role::User),
            loading: false,
        };
        assert_eq!(guard.decide(&auth, &meals()), RouteDecision::RedirectToLogin(meals()));
    }

    #[test]
    fn test_allowed_role_renders() {
        let guard = RouteGuard::new([Role::User, Role::Admin], homes());
        assert_eq!(
            guard.decide(&AuthState::signed_in(Role::Admin), &meals()),
            RouteDecision::Render
        );
    }

    #[test]
    fn test_disallowed_role_goes_to_role_home() {
        let guard = RouteGuard::new([Role::Admin], homes());
        assert_eq!(
            guard.decide(&AuthState::signed_in(Role::Trainer), &meals()),
            RouteDecision::RedirectTo("/trainer".to_string())
        );
    }

    #[test]
    fn test_missing_home_falls_back_to_default() {
        let guard = RouteGuard::new([Role::Admin], homes());
        assert_eq!(
            guard.decide(&AuthState::signed_in(Role::Nutritionist), &meals()),
            RouteDecision::RedirectTo("/".to_string())
        );
    }

    #[test]
    fn test_authenticated_without_role_never_renders() {
        let guard = RouteGuard::new(Role::ALL, homes());
        let auth = AuthState {
            authenticated: true,
            role: None,
            loading: false,
        };
        assert_eq!(guard.decide(&auth, &meals()), RouteDecision::RedirectTo("/".to_string()));
    }

    #[test]
    fn test_empty_allowed_set_never_renders() {
        let guard = RouteGuard::new([], homes());
        assert!(guard.allowed_roles().is_empty());
        assert_eq!(
            guard.decide(&AuthState::signed_in(Role::Admin), &meals()),
            RouteDecision::RedirectTo("/admin".to_string())
        );
    }

    #[test]
    fn test_decisions_are_repeatable() {
        let guard = RouteGuard::new([Role::Admin], homes());
        let auth = AuthState::signed_in(Role::Trainer);
        assert_eq!(guard.decide(&auth, &meals()), guard.decide(&auth, &meals()));
    }

    #[test]
    fn test_location_parse_and_display() {
        let loc = meals();
        assert_eq!(loc.pathname, "/meals");
        assert_eq!(loc.search, "?day=mon");
        assert_eq!(loc.hash, "#lunch");
        assert_eq!(loc.to_string(), "/meals?day=mon#lunch");
        assert_eq!(Location::parse("").pathname, "/");
    }

    #[test]
    fn test_protected_route_covers_subpaths_only() {
        let route = ProtectedRoute::new("/trainer", [Role::Trainer]);
        assert!(route.covers("/trainer"));
        assert!(route.covers("/trainer/clients"));
        assert!(!route.covers("/trainers"));
        assert!(!route.covers("/"));
        assert!(route.admits(Role::Trainer));
        assert!(!route.admits(Role::Admin));
    }
}
