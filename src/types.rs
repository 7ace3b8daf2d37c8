//! Core access control types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Built-in role identifier granted to server administrators
pub const ROLE_GRAFANA_ADMIN: &str = "Grafana Admin";

/// Organization role of a signed-in user
///
/// The known roles form the hierarchy `Viewer < Editor < Admin`. Any other
/// role name is carried through as [`OrgRole::Other`]: it resolves to itself
/// only and is granted nothing unless the permission table names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrgRole {
    Viewer,
    Editor,
    Admin,
    Other(String),
}

impl OrgRole {
    /// Returns the role identifier as used in the permission table
    pub fn as_str(&self) -> &str {
        match self {
            OrgRole::Viewer => "Viewer",
            OrgRole::Editor => "Editor",
            OrgRole::Admin => "Admin",
            OrgRole::Other(name) => name,
        }
    }
}

impl From<&str> for OrgRole {
    fn from(s: &str) -> Self {
        match s {
            "Viewer" => OrgRole::Viewer,
            "Editor" => OrgRole::Editor,
            "Admin" => OrgRole::Admin,
            other => OrgRole::Other(other.to_string()),
        }
    }
}

impl From<String> for OrgRole {
    fn from(s: String) -> Self {
        OrgRole::from(s.as_str())
    }
}

impl From<OrgRole> for String {
    fn from(role: OrgRole) -> Self {
        match role {
            OrgRole::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user as seen by the evaluator
///
/// This crate only authorizes; it never authenticates or mutates the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    /// User identifier
    pub user_id: i64,

    /// Organization the user is signed into
    pub org_id: i64,

    /// Login name
    pub login: String,

    /// Role within the current organization
    pub org_role: OrgRole,

    /// Server-wide administrator flag
    #[serde(default)]
    pub is_grafana_admin: bool,
}

impl SignedInUser {
    /// Create a user with the given login and organization role
    pub fn new(login: impl Into<String>, org_role: impl Into<OrgRole>) -> Self {
        Self {
            user_id: 0,
            org_id: 1,
            login: login.into(),
            org_role: org_role.into(),
            is_grafana_admin: false,
        }
    }

    /// Set the user identifier
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Set the organization identifier
    pub fn with_org_id(mut self, org_id: i64) -> Self {
        self.org_id = org_id;
        self
    }

    /// Set the server administrator flag
    pub fn with_grafana_admin(mut self, is_grafana_admin: bool) -> Self {
        self.is_grafana_admin = is_grafana_admin;
        self
    }
}

/// A grantable capability: an action optionally narrowed by a scope
///
/// The scope may be a glob pattern (see [`crate::scope`]). An empty scope
/// means the permission is not tied to any resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Operation name (e.g., "users:read")
    pub action: String,

    /// Target qualifier (e.g., "users:*")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

impl Permission {
    /// Create a scoped permission
    pub fn new(action: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: scope.into(),
        }
    }

    /// Create a permission without a scope
    pub fn unscoped(action: impl Into<String>) -> Self {
        Self::new(action, String::new())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.action)
        } else {
            write!(f, "{} on {}", self.action, self.scope)
        }
    }
}

/// Per-request context forwarded to permission sources
///
/// Carries the request identifier used to correlate log output.
/// Cancellation is handled by dropping the evaluation future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Create a context with a fresh request identifier
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a context with a caller-supplied request identifier
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
