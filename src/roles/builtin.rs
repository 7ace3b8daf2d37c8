//! Built-in predefined roles, actions and scopes
//!
//! Action and scope strings are matched exactly against what request
//! handlers ask for, so a typo here silently denies access.

use super::predefined::{PermissionTable, PredefinedRole};
use crate::types::{Permission, ROLE_GRAFANA_ADMIN};

// Users actions
pub const ACTION_USERS_READ: &str = "users:read";
pub const ACTION_USERS_WRITE: &str = "users:write";
pub const ACTION_USERS_TEAMS_READ: &str = "users.teams:read";
pub const ACTION_USERS_AUTH_TOKEN_LIST: &str = "users.authtoken:list";
pub const ACTION_USERS_AUTH_TOKEN_UPDATE: &str = "users.authtoken:update";
pub const ACTION_USERS_PASSWORD_UPDATE: &str = "users.password:update";
pub const ACTION_USERS_DELETE: &str = "users:delete";
pub const ACTION_USERS_CREATE: &str = "users:create";
pub const ACTION_USERS_ENABLE: &str = "users:enable";
pub const ACTION_USERS_DISABLE: &str = "users:disable";
pub const ACTION_USERS_PERMISSIONS_UPDATE: &str = "users.permissions:update";
pub const ACTION_USERS_LOGOUT: &str = "users:logout";
pub const ACTION_USERS_QUOTAS_LIST: &str = "users.quotas:list";
pub const ACTION_USERS_QUOTAS_UPDATE: &str = "users.quotas:update";

// Org actions
pub const ACTION_ORG_USERS_READ: &str = "org.users:read";
pub const ACTION_ORG_USERS_ADD: &str = "org.users:add";
pub const ACTION_ORG_USERS_REMOVE: &str = "org.users:remove";
pub const ACTION_ORG_USERS_ROLE_UPDATE: &str = "org.users.role:update";

// LDAP actions
pub const ACTION_LDAP_USERS_READ: &str = "ldap.user:read";
pub const ACTION_LDAP_USERS_SYNC: &str = "ldap.user:sync";
pub const ACTION_LDAP_STATUS_READ: &str = "ldap.status:read";

/// All users across the server
pub const SCOPE_GLOBAL_USERS_ALL: &str = "global:users:*";

/// All users in the current organization
pub const SCOPE_USERS_ALL: &str = "users:*";

pub const ROLE_USERS_ADMIN_READ: &str = "grafana:roles:users:admin:read";
pub const ROLE_USERS_ADMIN_EDIT: &str = "grafana:roles:users:admin:edit";
pub const ROLE_USERS_ORG_READ: &str = "grafana:roles:users:org:read";
pub const ROLE_USERS_ORG_EDIT: &str = "grafana:roles:users:org:edit";
pub const ROLE_LDAP_ADMIN_READ: &str = "grafana:roles:ldap:admin:read";
pub const ROLE_LDAP_ADMIN_EDIT: &str = "grafana:roles:ldap:admin:edit";

fn scoped(actions: &[&str], scope: &str) -> Vec<Permission> {
    actions.iter().map(|a| Permission::new(*a, scope)).collect()
}

fn unscoped(actions: &[&str]) -> Vec<Permission> {
    actions.iter().map(|a| Permission::unscoped(*a)).collect()
}

fn concat(a: &[Permission], b: Vec<Permission>) -> Vec<Permission> {
    let mut out = a.to_vec();
    out.extend(b);
    out
}

impl PermissionTable {
    /// The predefined roles and grants shipped with the server
    pub fn builtin() -> Self {
        let users_admin_read = scoped(
            &[
                ACTION_USERS_READ,
                ACTION_USERS_TEAMS_READ,
                ACTION_USERS_AUTH_TOKEN_LIST,
                ACTION_USERS_QUOTAS_LIST,
            ],
            SCOPE_GLOBAL_USERS_ALL,
        );
        let users_admin_edit = concat(
            &users_admin_read,
            scoped(
                &[
                    ACTION_USERS_PASSWORD_UPDATE,
                    ACTION_USERS_WRITE,
                    ACTION_USERS_DELETE,
                    ACTION_USERS_CREATE,
                    ACTION_USERS_ENABLE,
                    ACTION_USERS_DISABLE,
                    ACTION_USERS_PERMISSIONS_UPDATE,
                    ACTION_USERS_LOGOUT,
                    ACTION_USERS_AUTH_TOKEN_UPDATE,
                    ACTION_USERS_QUOTAS_UPDATE,
                ],
                SCOPE_GLOBAL_USERS_ALL,
            ),
        );

        let users_org_read = scoped(&[ACTION_ORG_USERS_READ], SCOPE_USERS_ALL);
        let users_org_edit = concat(
            &users_org_read,
            scoped(
                &[
                    ACTION_ORG_USERS_ADD,
                    ACTION_ORG_USERS_REMOVE,
                    ACTION_ORG_USERS_ROLE_UPDATE,
                ],
                SCOPE_USERS_ALL,
            ),
        );

        let ldap_admin_read = unscoped(&[ACTION_LDAP_USERS_READ, ACTION_LDAP_STATUS_READ]);
        let ldap_admin_edit = concat(&ldap_admin_read, unscoped(&[ACTION_LDAP_USERS_SYNC]));

        PermissionTable::new()
            .with_role(PredefinedRole::new(ROLE_USERS_ADMIN_READ, users_admin_read))
            .with_role(PredefinedRole::new(ROLE_USERS_ADMIN_EDIT, users_admin_edit))
            .with_role(PredefinedRole::new(ROLE_USERS_ORG_READ, users_org_read))
            .with_role(PredefinedRole::new(ROLE_USERS_ORG_EDIT, users_org_edit))
            .with_role(PredefinedRole::new(ROLE_LDAP_ADMIN_READ, ldap_admin_read))
            .with_role(PredefinedRole::new(ROLE_LDAP_ADMIN_EDIT, ldap_admin_edit))
            .with_grant(
                ROLE_GRAFANA_ADMIN,
                [
                    ROLE_USERS_ADMIN_READ,
                    ROLE_USERS_ADMIN_EDIT,
                    ROLE_LDAP_ADMIN_READ,
                    ROLE_LDAP_ADMIN_EDIT,
                ],
            )
            .with_grant("Admin", [ROLE_USERS_ORG_READ, ROLE_USERS_ORG_EDIT])
    }
}
