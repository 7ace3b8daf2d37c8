//! # Access Control (accesscontrol)
//!
//! Role based access control evaluator:
//! - Built-in role hierarchy (`Admin` includes `Editor` includes `Viewer`)
//! - Static predefined roles granted to built-in roles
//! - Permission aggregation per signed-in user
//! - Point evaluation of an action against one or more scopes, with
//!   wildcard scope matching
//!
//! Evaluation is stateless: every call recomputes the user's permissions
//! from the immutable permission table.
//!
//! ## Example
//!
//! ```rust
//! use accesscontrol::{
//!     AccessControl, AccessControlConfig, OrgRole, OssAccessControlService,
//!     Permission, PermissionTable, PredefinedRole, RequestContext, SignedInUser,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> accesscontrol::Result<()> {
//! let table = PermissionTable::new()
//!     .with_role(PredefinedRole::new(
//!         "folder_reader",
//!         vec![Permission::new("folders:read", "folders:*")],
//!     ))
//!     .with_grant("Viewer", ["folder_reader"]);
//!
//! let service = OssAccessControlService::new(
//!     Some(Arc::new(AccessControlConfig::enabled())),
//!     Arc::new(table),
//! );
//!
//! let ctx = RequestContext::new();
//! let user = SignedInUser::new("alice", OrgRole::Editor);
//!
//! assert!(service.evaluate(&ctx, &user, "folders:read", &["folders:7"]).await?);
//! assert!(!service.evaluate(&ctx, &user, "folders:write", &["folders:7"]).await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod roles;
pub mod scope;
pub mod service;
pub mod types;

pub use config::{AccessControlConfig, FeatureToggles, FEATURE_TOGGLE_ACCESSCONTROL};
pub use error::{AuthzError, Result};
pub use evaluator::{evaluate, evaluate_permissions};
pub use metrics::{InMemoryUsageStats, MetricsCollector, UsageStats};
pub use roles::{PermissionTable, PredefinedRole, RoleHierarchy};
pub use scope::{ScopeConfig, ScopeMatcher};
pub use service::{AccessControl, OssAccessControlService};
pub use types::{OrgRole, Permission, RequestContext, SignedInUser, ROLE_GRAFANA_ADMIN};
