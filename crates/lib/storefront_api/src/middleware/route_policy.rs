//! Route perimeter evaluated before any handler.
//!
//! Rules are path prefixes matched on segment boundaries; the longest
//! matching prefix decides. A path no rule covers is rejected as
//! unauthenticated.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use storefront_core::models::identity::Role;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::middleware::auth::authenticate;

/// What a caller needs to reach a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    /// A valid token whose role is one of these.
    Roles(&'static [Role]),
}

const STAFF: &[Role] = &[Role::Owner, Role::Admin];
const CUSTOMER: &[Role] = &[Role::User];

#[derive(Debug, Clone)]
struct Rule {
    prefix: &'static str,
    access: Access,
}

/// Ordered set of prefix rules.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<Rule>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::storefront()
    }
}

impl RoutePolicy {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule(mut self, prefix: &'static str, access: Access) -> Self {
        self.rules.push(Rule { prefix, access });
        self
    }

    /// The storefront's perimeter.
    pub fn storefront() -> Self {
        Self::new()
            .rule("/api/auth", Access::Public)
            .rule("/api/auth/user", Access::Authenticated)
            .rule("/api/users", Access::Authenticated)
            .rule("/api/profile", Access::Authenticated)
            .rule("/api/wishlist", Access::Authenticated)
            .rule("/api/reviews", Access::Authenticated)
            .rule("/profile", Access::Roles(CUSTOMER))
            .rule("/api/admin/auth", Access::Public)
            .rule("/api/admin", Access::Roles(STAFF))
            .rule("/api/orders", Access::Authenticated)
            .rule("/api/products", Access::Public)
            .rule("/api/virtual-codes", Access::Public)
            .rule("/api/health", Access::Public)
    }

    /// Access required for `path`, or `None` when no rule covers it.
    pub fn access_for(&self, path: &str) -> Option<Access> {
        self.rules
            .iter()
            .filter(|rule| covers(rule.prefix, path))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.access)
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Axum middleware applying [`RoutePolicy`] from the state.
pub async fn enforce_route_policy(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    match state.policy.access_for(path) {
        Some(Access::Public) => {}
        Some(Access::Authenticated) => {
            authenticate(&state, &request)?;
        }
        Some(Access::Roles(roles)) => {
            let claims = authenticate(&state, &request)?;
            if !roles.contains(&claims.role()) {
                debug!(path, role = %claims.role(), "role not allowed on route");
                return Err(AppError::Unauthorized("insufficient-role-error".into()));
            }
        }
        None => {
            debug!(path, "no perimeter rule covers path");
            return Err(AppError::Unauthenticated("route-not-allowed".into()));
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let policy = RoutePolicy::storefront();
        assert_eq!(policy.access_for("/api/auth/login"), Some(Access::Public));
        assert_eq!(
            policy.access_for("/api/auth/user"),
            Some(Access::Authenticated)
        );
        assert_eq!(
            policy.access_for("/api/admin/auth/login"),
            Some(Access::Public)
        );
        assert_eq!(
            policy.access_for("/api/admin/orders/1/confirm"),
            Some(Access::Roles(STAFF))
        );
    }

    #[test]
    fn prefixes_match_whole_segments() {
        let policy = RoutePolicy::storefront();
        assert_eq!(
            policy.access_for("/api/auth/username"),
            Some(Access::Public)
        );
        assert_eq!(policy.access_for("/api/healthz"), None);
        assert_eq!(policy.access_for("/api/health"), Some(Access::Public));
    }

    #[test]
    fn unmatched_paths_are_denied() {
        let policy = RoutePolicy::storefront();
        assert_eq!(policy.access_for("/"), None);
        assert_eq!(policy.access_for("/api/secret"), None);
        assert_eq!(policy.access_for("/admin"), None);
    }

    #[test]
    fn customer_profile_needs_user_role() {
        let policy = RoutePolicy::storefront();
        assert_eq!(policy.access_for("/profile"), Some(Access::Roles(CUSTOMER)));
        assert_eq!(
            policy.access_for("/api/products/p1/reviews"),
            Some(Access::Public)
        );
    }
}
