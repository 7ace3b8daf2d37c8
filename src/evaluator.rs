//! Permission evaluation
//!
//! Resolves a single "may this user perform `action` on one of `scopes`"
//! query against the permissions an [`AccessControl`] implementation reports
//! for the user.

use crate::error::Result;
use crate::scope::ScopeMatcher;
use crate::service::AccessControl;
use crate::types::{Permission, RequestContext, SignedInUser};
use indexmap::IndexSet;
use tracing::debug;

/// Evaluate access for a user
///
/// Fetches the user's permissions from `ac` and checks them with
/// [`evaluate_permissions`]. A failure to fetch permissions is returned as
/// an error and never turned into an allow or a deny.
pub async fn evaluate<A>(
    ac: &A,
    matcher: &ScopeMatcher,
    ctx: &RequestContext,
    user: &SignedInUser,
    action: &str,
    scopes: &[&str],
) -> Result<bool>
where
    A: AccessControl + ?Sized,
{
    let permissions = ac.get_user_permissions(ctx, user).await?;

    let allowed = evaluate_permissions(matcher, &permissions, action, scopes)?;

    debug!(
        "Evaluation [{}]: user={}, action={}, scopes={:?}, permissions={}, allowed={}",
        ctx.request_id,
        user.login,
        action,
        scopes,
        permissions.len(),
        allowed
    );

    Ok(allowed)
}

/// Check an action and requested scopes against a set of permissions
///
/// Grants access if some permission has exactly `action` and its scope
/// matches at least one of `scopes`. With no requested scopes, a permission
/// with a matching action is enough.
pub fn evaluate_permissions<S: AsRef<str>>(
    matcher: &ScopeMatcher,
    permissions: &[Permission],
    action: &str,
    scopes: &[S],
) -> Result<bool> {
    let granted = granted_scopes(permissions, action);

    if granted.is_empty() {
        return Ok(false);
    }

    if scopes.is_empty() {
        return Ok(true);
    }

    for pattern in granted {
        if matcher.matches_any(pattern, scopes)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Distinct scopes under which `action` is granted, in grant order
pub fn granted_scopes<'a>(permissions: &'a [Permission], action: &str) -> IndexSet<&'a str> {
    permissions
        .iter()
        .filter(|p| p.action == action)
        .map(|p| p.scope.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permissions() -> Vec<Permission> {
        vec![
            Permission::unscoped("dashboards:read"),
            Permission::new("folders:read", "folders:*"),
            Permission::new("folders:read", "folders:*"),
            Permission::new("users:read", "users:self"),
        ]
    }

    #[test]
    fn test_unscoped_request_matches_action() {
        let matcher = ScopeMatcher::default();
        let none: [&str; 0] = [];

        assert!(evaluate_permissions(&matcher, &permissions(), "dashboards:read", &none).unwrap());
        assert!(evaluate_permissions(&matcher, &permissions(), "folders:read", &none).unwrap());
        assert!(!evaluate_permissions(&matcher, &permissions(), "dashboards:write", &none).unwrap());
    }

    #[test]
    fn test_scoped_request() {
        let matcher = ScopeMatcher::default();

        assert!(evaluate_permissions(&matcher, &permissions(), "folders:read", &["folders:7"]).unwrap());
        assert!(!evaluate_permissions(&matcher, &permissions(), "folders:write", &["folders:7"]).unwrap());
        assert!(!evaluate_permissions(&matcher, &permissions(), "users:read", &["users:42"]).unwrap());
    }

    #[test]
    fn test_any_requested_scope_is_enough() {
        let matcher = ScopeMatcher::default();

        assert!(evaluate_permissions(
            &matcher,
            &permissions(),
            "users:read",
            &["users:42", "users:self"]
        )
        .unwrap());
    }

    #[test]
    fn test_unscoped_permission_does_not_match_scoped_request() {
        let matcher = ScopeMatcher::default();
        assert!(!evaluate_permissions(
            &matcher,
            &permissions(),
            "dashboards:read",
            &["dashboards:1"]
        )
        .unwrap());
    }

    #[test]
    fn test_granted_scopes_are_deduplicated() {
        let perms = permissions();
        let scopes = granted_scopes(&perms, "folders:read");
        assert_eq!(scopes.len(), 1);
        assert!(scopes.contains("folders:*"));
    }

    #[test]
    fn test_empty_permission_set_denies() {
        let matcher = ScopeMatcher::default();
        assert!(!evaluate_permissions(&matcher, &[], "dashboards:read", &["dashboards:1"]).unwrap());
    }
}
