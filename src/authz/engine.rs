use axum::http::Method;

use crate::authz::errors::AuthzError;
use crate::authz::types::{Decision, DenyReason};
use crate::authz::AccessControl;
use crate::identity::Identity;

/// Decide whether `identity` may perform `method` on `path`.
///
/// Pure function of its inputs and the immutable state: no I/O, no shared
/// mutable anything. Every failure path resolves to a `Decision` — internal
/// faults are logged and collapse to `Deny(InternalError)`, never an error
/// escaping to the caller.
pub fn authorize(
    state: &AccessControl,
    identity: Option<&Identity>,
    method: &Method,
    path: &str,
) -> Decision {
    match evaluate(state, identity, method, path) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::error!(%err, %method, path, "authorization evaluation failed");
            Decision::Deny(DenyReason::InternalError)
        }
    }
}

fn evaluate(
    state: &AccessControl,
    identity: Option<&Identity>,
    method: &Method,
    path: &str,
) -> Result<Decision, AuthzError> {
    // 1. No identity: deny before even looking at the route.
    let Some(identity) = identity else {
        return Ok(Decision::Deny(DenyReason::Unauthenticated));
    };

    // 2. Resolve the route pattern.
    let Some(entry) = state.routes.resolve(method, path) else {
        return Ok(Decision::Deny(DenyReason::RouteNotFound));
    };

    // 3. An empty requirement set marks an explicitly public route.
    if entry.permissions.is_empty() {
        return Ok(Decision::Allow);
    }

    // 4. ANY-of: one held permission from the required set suffices.
    let held = state.catalog.permissions_for(&identity.role);
    if entry.permissions.iter().any(|p| held.contains(p)) {
        return Ok(Decision::Allow);
    }

    // 5. Authenticated, route known, nothing held.
    Ok(Decision::Deny(DenyReason::InsufficientPermission))
}
