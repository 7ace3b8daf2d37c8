//! Predefined roles and the grants table
//!
//! A [`PermissionTable`] holds two immutable maps: predefined role name to
//! [`PredefinedRole`], and built-in role to the predefined role names it is
//! granted. It is built once and shared read-only behind an `Arc`.

use crate::error::{AuthzError, Result};
use crate::types::Permission;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A named, versioned bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedRole {
    /// Unique role name (e.g., "grafana:roles:users:admin:read")
    pub name: String,

    /// Definition version
    #[serde(default = "default_version")]
    pub version: i64,

    /// Granted permissions, in declaration order
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

fn default_version() -> i64 {
    1
}

impl PredefinedRole {
    /// Create a role at version 1
    pub fn new(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            permissions,
        }
    }

    /// Set the definition version
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }
}

/// On-disk shape of a permission table
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    roles: Vec<PredefinedRole>,
    #[serde(default)]
    grants: IndexMap<String, Vec<String>>,
}

/// Immutable lookup from built-in roles to permissions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    roles: IndexMap<String, PredefinedRole>,
    grants: IndexMap<String, Vec<String>>,
}

impl PermissionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a predefined role
    pub fn with_role(mut self, role: PredefinedRole) -> Self {
        self.roles.insert(role.name.clone(), role);
        self
    }

    /// Grant predefined roles to a built-in role
    pub fn with_grant<I, S>(mut self, built_in_role: impl Into<String>, role_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(built_in_role.into())
            .or_default()
            .extend(role_names.into_iter().map(Into::into));
        self
    }

    /// Parse a table from JSON
    ///
    /// ```json
    /// {
    ///   "roles": [{"name": "viewer_role", "permissions": [{"action": "dashboards:read"}]}],
    ///   "grants": {"Viewer": ["viewer_role"]}
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, empty role names, or a role name declared twice.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(json)?;

        let mut roles = IndexMap::with_capacity(file.roles.len());
        for role in file.roles {
            if role.name.is_empty() {
                return Err(AuthzError::InvalidTable(
                    "predefined role name cannot be empty".to_string(),
                ));
            }
            if roles.contains_key(&role.name) {
                return Err(AuthzError::InvalidTable(format!(
                    "predefined role '{}' declared more than once",
                    role.name
                )));
            }
            roles.insert(role.name.clone(), role);
        }

        let table = Self {
            roles,
            grants: file.grants,
        };
        debug!(
            "Loaded permission table: {} roles, {} grants",
            table.roles.len(),
            table.grants.len()
        );
        Ok(table)
    }

    /// Load a JSON table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Serialize the table in the format accepted by [`Self::from_json_str`]
    pub fn to_json_string(&self) -> Result<String> {
        let file = TableFile {
            roles: self.roles.values().cloned().collect(),
            grants: self.grants.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Look up a predefined role by name
    pub fn role(&self, name: &str) -> Option<&PredefinedRole> {
        self.roles.get(name)
    }

    /// Predefined role names granted to a built-in role
    pub fn grants(&self, built_in_role: &str) -> Option<&[String]> {
        self.grants.get(built_in_role).map(Vec::as_slice)
    }

    /// Iterate over all predefined roles in declaration order
    pub fn roles(&self) -> impl Iterator<Item = &PredefinedRole> {
        self.roles.values()
    }

    /// Iterate over all grants in declaration order
    pub fn all_grants(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.grants.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Expand built-in roles into the permissions they are granted
    ///
    /// Built-in roles without grants and grants naming unknown predefined
    /// roles contribute nothing. The result holds owned copies, so callers
    /// may modify it freely. Duplicates across roles are kept.
    pub fn permissions_for<S: AsRef<str>>(&self, built_in_roles: &[S]) -> Vec<Permission> {
        let mut permissions = Vec::new();

        for built_in in built_in_roles {
            let Some(role_names) = self.grants.get(built_in.as_ref()) else {
                continue;
            };
            for name in role_names {
                let Some(role) = self.roles.get(name) else {
                    continue;
                };
                permissions.extend(role.permissions.iter().cloned());
            }
        }

        permissions
    }

    /// Report grants that reference unknown predefined roles
    ///
    /// Dangling references are tolerated at evaluation time, so they are
    /// returned as warnings rather than errors. Logging them is up to the
    /// caller.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (built_in, names) in &self.grants {
            for name in names {
                if !self.roles.contains_key(name) {
                    warnings.push(format!(
                        "built-in role '{}' is granted unknown predefined role '{}'",
                        built_in, name
                    ));
                }
            }
        }

        warnings
    }
}
