//! Built-in roles and predefined role tables
//!
//! Provides the role hierarchy used to expand a user's organization role and
//! the static table that maps built-in roles to permissions.
//!
//! # Example
//!
//! ```rust
//! use accesscontrol::roles::{PermissionTable, PredefinedRole, RoleHierarchy};
//! use accesscontrol::{OrgRole, Permission, SignedInUser};
//!
//! let table = PermissionTable::new()
//!     .with_role(PredefinedRole::new(
//!         "viewer_role",
//!         vec![Permission::unscoped("dashboards:read")],
//!     ))
//!     .with_grant("Viewer", ["viewer_role"]);
//!
//! let hierarchy = RoleHierarchy::builtin();
//! let user = SignedInUser::new("alice", OrgRole::Editor);
//!
//! // Editors include Viewer, so they get the viewer grants too
//! let roles = hierarchy.built_in_roles(&user);
//! assert_eq!(roles, vec!["Editor", "Viewer"]);
//! assert_eq!(table.permissions_for(&roles).len(), 1);
//! ```

pub mod builtin;
pub mod hierarchy;
pub mod predefined;


pub use hierarchy::{RoleHierarchy, RoleHierarchyBuilder};
pub use predefined::{PermissionTable, PredefinedRole};
