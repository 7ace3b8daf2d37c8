//! Built-in role hierarchy
//!
//! Maps each built-in role to the roles it implicitly includes. Higher
//! privilege roles list the lower ones as children, so an `Admin` also holds
//! everything granted to `Editor` and `Viewer`.
//!
//! The hierarchy is checked for cycles when it is built, and traversal keeps a
//! visited set, so resolution always terminates.

use crate::error::{AuthzError, Result};
use crate::types::{SignedInUser, ROLE_GRAFANA_ADMIN};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Directed acyclic role hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    children: IndexMap<String, Vec<String>>,
}

impl RoleHierarchy {
    /// The organization role hierarchy: `Admin → Editor → Viewer`
    pub fn builtin() -> Self {
        let mut children = IndexMap::new();
        children.insert(
            "Admin".to_string(),
            vec!["Editor".to_string(), "Viewer".to_string()],
        );
        children.insert("Editor".to_string(), vec!["Viewer".to_string()]);
        children.insert("Viewer".to_string(), Vec::new());

        Self { children }
    }

    /// Start building a custom hierarchy
    pub fn builder() -> RoleHierarchyBuilder {
        RoleHierarchyBuilder::default()
    }

    /// Direct children of a role (empty for unknown roles)
    pub fn children(&self, role: &str) -> &[String] {
        self.children.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every role reachable from `role`, excluding `role` itself
    ///
    /// Depth-first in declared child order; each role appears once.
    pub fn descendants(&self, role: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(role);

        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.children(role).iter().rev().map(String::as_str).collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current.to_string());
            for child in self.children(current).iter().rev() {
                if !visited.contains(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }

        out
    }

    /// Built-in roles held by a user
    ///
    /// The user's own organization role comes first, followed by every role it
    /// includes, followed by [`ROLE_GRAFANA_ADMIN`] for server administrators.
    /// Unknown organization roles resolve to themselves only.
    pub fn built_in_roles(&self, user: &SignedInUser) -> Vec<String> {
        let own = user.org_role.as_str();

        let mut roles = vec![own.to_string()];
        roles.extend(self.descendants(own));

        if user.is_grafana_admin {
            roles.push(ROLE_GRAFANA_ADMIN.to_string());
        }

        roles
    }

    /// Number of roles with declared children lists
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the hierarchy declares no roles
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Check that the hierarchy is acyclic
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::CircularHierarchy`] with the offending path.
    pub fn validate(&self) -> Result<()> {
        let mut state: HashMap<&str, VisitState> = HashMap::new();

        for role in self.children.keys() {
            if !state.contains_key(role.as_str()) {
                let mut path = Vec::new();
                self.visit(role, &mut state, &mut path)?;
            }
        }

        Ok(())
    }

    fn visit<'a>(
        &'a self,
        role: &'a str,
        state: &mut HashMap<&'a str, VisitState>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match state.get(role) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                let start = path.iter().position(|r| *r == role).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|r| r.to_string()).collect();
                cycle.push(role.to_string());
                return Err(AuthzError::CircularHierarchy { cycle });
            }
            None => {}
        }

        state.insert(role, VisitState::Visiting);
        path.push(role);

        for child in self.children(role) {
            self.visit(child, state, path)?;
        }

        path.pop();
        state.insert(role, VisitState::Visited);
        Ok(())
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Builder for [`RoleHierarchy`] that validates on completion
#[derive(Debug, Default)]
pub struct RoleHierarchyBuilder {
    children: IndexMap<String, Vec<String>>,
}

impl RoleHierarchyBuilder {
    /// Declare the direct children of a role
    pub fn role<I, S>(mut self, name: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.children.entry(name.into()).or_default();
        for child in children {
            let child = child.into();
            if !entry.contains(&child) {
                entry.push(child);
            }
        }
        self
    }

    /// Finish the hierarchy
    ///
    /// # Errors
    ///
    /// Fails if the declared roles form a cycle.
    pub fn build(self) -> Result<RoleHierarchy> {
        let hierarchy = RoleHierarchy {
            children: self.children,
        };
        hierarchy.validate()?;
        Ok(hierarchy)
    }
}
