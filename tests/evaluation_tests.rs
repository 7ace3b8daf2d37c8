//! End-to-end evaluation tests
//!
//! Drives the service through the `AccessControl` contract:
//! built-in roles → predefined role grants → permissions → scope matching

use accesscontrol::{
    evaluate,
    roles::builtin::{
        ACTION_LDAP_STATUS_READ, ACTION_ORG_USERS_ADD, ACTION_ORG_USERS_READ, ACTION_USERS_READ,
        ACTION_USERS_WRITE,
    },
    AccessControl, AccessControlConfig, AuthzError, InMemoryUsageStats, OrgRole,
    OssAccessControlService, Permission, PermissionTable, PredefinedRole, RequestContext, Result,
    ScopeMatcher, SignedInUser,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scenario_table() -> PermissionTable {
    PermissionTable::new()
        .with_role(PredefinedRole::new(
            "viewer_role",
            vec![Permission::unscoped("dashboards:read")],
        ))
        .with_role(PredefinedRole::new(
            "admin_role",
            vec![Permission::unscoped("users:write")],
        ))
        .with_role(PredefinedRole::new(
            "folder_reader",
            vec![Permission::new("folders:read", "folders:*")],
        ))
        .with_grant("Viewer", ["viewer_role", "folder_reader"])
        .with_grant("Grafana Admin", ["admin_role"])
}

fn enabled_service(table: PermissionTable) -> OssAccessControlService {
    OssAccessControlService::new(Some(Arc::new(AccessControlConfig::enabled())), Arc::new(table))
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_viewer_reads_but_cannot_write() {
    let svc = enabled_service(scenario_table());
    let ctx = RequestContext::new();
    let viewer = SignedInUser::new("viewer", OrgRole::Viewer);

    assert!(svc.evaluate(&ctx, &viewer, "dashboards:read", &[]).await.unwrap());
    assert!(!svc.evaluate(&ctx, &viewer, "dashboards:write", &[]).await.unwrap());
}

#[tokio::test]
async fn test_server_admin_flag_required_for_admin_grant() {
    let svc = enabled_service(scenario_table());
    let ctx = RequestContext::new();

    let admin = SignedInUser::new("root", OrgRole::Viewer).with_grafana_admin(true);
    let plain = SignedInUser::new("alice", OrgRole::Admin);

    assert!(svc.evaluate(&ctx, &admin, "users:write", &[]).await.unwrap());
    assert!(!svc.evaluate(&ctx, &plain, "users:write", &[]).await.unwrap());
}

#[tokio::test]
async fn test_wildcard_scope_grants_matching_action_only() {
    let svc = enabled_service(scenario_table());
    let ctx = RequestContext::new();
    let viewer = SignedInUser::new("viewer", OrgRole::Viewer);

    assert!(svc.evaluate(&ctx, &viewer, "folders:read", &["folders:7"]).await.unwrap());
    assert!(!svc.evaluate(&ctx, &viewer, "folders:write", &["folders:7"]).await.unwrap());
    assert!(!svc.evaluate(&ctx, &viewer, "folders:read", &["dashboards:7"]).await.unwrap());
}

#[test]
fn test_disabled_when_toggle_absent() {
    let svc = OssAccessControlService::new(
        Some(Arc::new(AccessControlConfig::with_toggles(["ngalert"]))),
        Arc::new(scenario_table()),
    );
    assert!(!svc.is_enabled());
    assert!(svc.is_disabled());
}

// ============================================================================
// HIERARCHY THROUGH THE SERVICE
// ============================================================================

#[tokio::test]
async fn test_higher_roles_inherit_lower_grants() {
    let svc = enabled_service(scenario_table());
    let ctx = RequestContext::new();

    for role in [OrgRole::Viewer, OrgRole::Editor, OrgRole::Admin] {
        let user = SignedInUser::new("user", role);
        assert!(svc.evaluate(&ctx, &user, "dashboards:read", &[]).await.unwrap());
    }
}

#[tokio::test]
async fn test_unknown_org_role_gets_nothing() {
    let svc = enabled_service(scenario_table());
    let ctx = RequestContext::new();
    let user = SignedInUser::new("guest", "Guest");

    assert_eq!(svc.get_user_built_in_roles(&user), vec!["Guest"]);
    assert!(svc.get_user_permissions(&ctx, &user).await.unwrap().is_empty());
    assert!(!svc.evaluate(&ctx, &user, "dashboards:read", &[]).await.unwrap());
}

#[tokio::test]
async fn test_any_requested_scope_is_enough() {
    let table = PermissionTable::new()
        .with_role(PredefinedRole::new(
            "team_reader",
            vec![Permission::new("teams:read", "teams:id:3")],
        ))
        .with_grant("Editor", ["team_reader"]);
    let svc = enabled_service(table);
    let ctx = RequestContext::new();
    let editor = SignedInUser::new("bob", OrgRole::Editor);

    assert!(svc
        .evaluate(&ctx, &editor, "teams:read", &["teams:id:1", "teams:id:3"])
        .await
        .unwrap());
    assert!(!svc
        .evaluate(&ctx, &editor, "teams:read", &["teams:id:1", "teams:id:2"])
        .await
        .unwrap());
}

// ============================================================================
// BUILT-IN TABLE
// ============================================================================

#[tokio::test]
async fn test_builtin_table_server_admin() {
    let svc = OssAccessControlService::from_config(AccessControlConfig::enabled()).unwrap();
    let ctx = RequestContext::new();
    let root = SignedInUser::new("root", OrgRole::Viewer).with_grafana_admin(true);

    assert!(svc
        .evaluate(&ctx, &root, ACTION_USERS_WRITE, &["global:users:42"])
        .await
        .unwrap());
    assert!(svc.evaluate(&ctx, &root, ACTION_LDAP_STATUS_READ, &[]).await.unwrap());
}

#[tokio::test]
async fn test_builtin_table_org_admin() {
    let svc = OssAccessControlService::from_config(AccessControlConfig::enabled()).unwrap();
    let ctx = RequestContext::new();
    let admin = SignedInUser::new("alice", OrgRole::Admin);

    assert!(svc
        .evaluate(&ctx, &admin, ACTION_ORG_USERS_READ, &["users:7"])
        .await
        .unwrap());
    assert!(svc
        .evaluate(&ctx, &admin, ACTION_ORG_USERS_ADD, &["users:7"])
        .await
        .unwrap());
    assert!(!svc
        .evaluate(&ctx, &admin, ACTION_USERS_READ, &["global:users:7"])
        .await
        .unwrap());
    assert!(!svc.evaluate(&ctx, &admin, ACTION_LDAP_STATUS_READ, &[]).await.unwrap());
}

#[tokio::test]
async fn test_builtin_table_editor_has_no_user_management() {
    let svc = OssAccessControlService::from_config(AccessControlConfig::enabled()).unwrap();
    let ctx = RequestContext::new();
    let editor = SignedInUser::new("bob", OrgRole::Editor);

    assert!(svc.get_user_permissions(&ctx, &editor).await.unwrap().is_empty());
}

// ============================================================================
// ERROR PROPAGATION
// ============================================================================

struct FailingAccessControl {
    calls: AtomicUsize,
}

#[async_trait]
impl AccessControl for FailingAccessControl {
    fn is_disabled(&self) -> bool {
        false
    }

    async fn evaluate(
        &self,
        _ctx: &RequestContext,
        _user: &SignedInUser,
        _action: &str,
        _scopes: &[&str],
    ) -> Result<bool> {
        Err(AuthzError::Internal("not used".to_string()))
    }

    async fn get_user_permissions(
        &self,
        _ctx: &RequestContext,
        _user: &SignedInUser,
    ) -> Result<Vec<Permission>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthzError::PermissionSource("role store unavailable".to_string()))
    }

    fn get_user_built_in_roles(&self, user: &SignedInUser) -> Vec<String> {
        vec![user.org_role.to_string()]
    }
}

#[tokio::test]
async fn test_permission_source_error_propagates() {
    let ac = FailingAccessControl {
        calls: AtomicUsize::new(0),
    };
    let matcher = ScopeMatcher::default();
    let ctx = RequestContext::new();
    let user = SignedInUser::new("alice", OrgRole::Admin);

    let result = evaluate(&ac, &matcher, &ctx, &user, "dashboards:read", &[]).await;

    assert!(matches!(result, Err(AuthzError::PermissionSource(_))));
    assert_eq!(ac.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_evaluate_through_trait_object() {
    let svc: Arc<dyn AccessControl> = Arc::new(enabled_service(scenario_table()));
    let matcher = ScopeMatcher::default();
    let ctx = RequestContext::with_request_id("req-1");
    let viewer = SignedInUser::new("viewer", OrgRole::Viewer);

    assert!(evaluate(svc.as_ref(), &matcher, &ctx, &viewer, "dashboards:read", &[])
        .await
        .unwrap());
}

// ============================================================================
// CONCURRENCY AND USAGE STATS
// ============================================================================

#[tokio::test]
async fn test_concurrent_evaluations() {
    let svc = Arc::new(enabled_service(scenario_table()));
    let mut handles = vec![];

    for i in 0..16 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::new();
            let user = SignedInUser::new(format!("user-{}", i), OrgRole::Editor);
            let scope = format!("folders:{}", i);
            svc.evaluate(&ctx, &user, "folders:read", &[scope.as_str()])
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let metrics = svc.metrics().snapshot().await;
    assert_eq!(metrics.allowed_evaluations, 16);
    assert_eq!(metrics.permission_lookups, 16);
}

#[test]
fn test_usage_stat_follows_toggle() {
    let stats = Arc::new(InMemoryUsageStats::new());

    let svc = enabled_service(scenario_table()).with_usage_stats(stats.clone());
    svc.init().unwrap();

    assert_eq!(
        stats.collect().get("stats.oss.accesscontrol.enabled.count"),
        Some(&json!(1))
    );
}
