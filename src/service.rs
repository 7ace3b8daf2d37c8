//! Access control service
//!
//! [`AccessControl`] is the contract callers (HTTP middleware, business
//! logic) depend on. [`OssAccessControlService`] implements it over the
//! built-in role hierarchy and a static [`PermissionTable`].

use crate::config::AccessControlConfig;
use crate::error::{AuthzError, Result};
use crate::evaluator;
use crate::metrics::{MetricCollector, MetricsCollector, UsageStats, METRIC_ACCESSCONTROL_ENABLED};
use crate::roles::{PermissionTable, RoleHierarchy};
use crate::scope::ScopeMatcher;
use crate::types::{Permission, RequestContext, SignedInUser};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Role based access control contract
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Whether access control is switched off
    ///
    /// When disabled, callers bypass checks and use their own authorization
    /// path. Evaluation itself is unaffected.
    fn is_disabled(&self) -> bool;

    /// Whether access control is switched on
    fn is_enabled(&self) -> bool {
        !self.is_disabled()
    }

    /// Decide whether `user` may perform `action` on any of `scopes`
    async fn evaluate(
        &self,
        ctx: &RequestContext,
        user: &SignedInUser,
        action: &str,
        scopes: &[&str],
    ) -> Result<bool>;

    /// All permissions granted to `user`
    async fn get_user_permissions(
        &self,
        ctx: &RequestContext,
        user: &SignedInUser,
    ) -> Result<Vec<Permission>>;

    /// Built-in roles held by `user`, own organization role first
    fn get_user_built_in_roles(&self, user: &SignedInUser) -> Vec<String>;
}

/// Access control backed by the built-in role hierarchy and a static table
pub struct OssAccessControlService {
    config: Option<Arc<AccessControlConfig>>,
    table: Arc<PermissionTable>,
    hierarchy: RoleHierarchy,
    matcher: ScopeMatcher,
    usage_stats: Option<Arc<dyn UsageStats>>,
    metrics: Arc<MetricsCollector>,
}

impl OssAccessControlService {
    /// Create a service
    ///
    /// Without a configuration the service reports itself disabled.
    pub fn new(config: Option<Arc<AccessControlConfig>>, table: Arc<PermissionTable>) -> Self {
        let matcher = ScopeMatcher::new(
            config
                .as_ref()
                .map(|c| c.scope.clone())
                .unwrap_or_default(),
        );

        Self {
            config,
            table,
            hierarchy: RoleHierarchy::builtin(),
            matcher,
            usage_stats: None,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Create a service from configuration, loading its permission table
    pub fn from_config(config: AccessControlConfig) -> Result<Self> {
        config.validate()?;

        let table = config.load_permission_table()?;
        for warning in table.validate() {
            warn!("{}", warning);
        }

        Ok(Self::new(Some(Arc::new(config)), Arc::new(table)))
    }

    /// Use a custom role hierarchy
    pub fn with_hierarchy(mut self, hierarchy: RoleHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Report usage statistics to `usage_stats` on [`Self::init`]
    pub fn with_usage_stats(mut self, usage_stats: Arc<dyn UsageStats>) -> Self {
        self.usage_stats = Some(usage_stats);
        self
    }

    /// Share a metrics collector with other components
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Register usage metrics
    pub fn init(&self) -> Result<()> {
        if let Some(usage_stats) = &self.usage_stats {
            let enabled = self.is_enabled();
            let collector: MetricCollector =
                Arc::new(move || Ok::<_, AuthzError>(json!(if enabled { 1 } else { 0 })));
            usage_stats.register_metric(METRIC_ACCESSCONTROL_ENABLED, collector);
        }

        info!(
            "Access control initialized: enabled={}, predefined_roles={}",
            self.is_enabled(),
            self.table.roles().count()
        );
        Ok(())
    }

    /// The permission table in use
    pub fn permission_table(&self) -> &PermissionTable {
        &self.table
    }

    /// The role hierarchy in use
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// The scope matcher in use
    pub fn scope_matcher(&self) -> &ScopeMatcher {
        &self.matcher
    }

    /// Evaluation metrics
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }
}

#[async_trait]
impl AccessControl for OssAccessControlService {
    fn is_disabled(&self) -> bool {
        match &self.config {
            Some(config) => !config.accesscontrol_enabled(),
            None => true,
        }
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        user: &SignedInUser,
        action: &str,
        scopes: &[&str],
    ) -> Result<bool> {
        let outcome = evaluator::evaluate(self, &self.matcher, ctx, user, action, scopes).await;
        self.metrics.record_evaluation(&outcome).await;
        outcome
    }

    async fn get_user_permissions(
        &self,
        ctx: &RequestContext,
        user: &SignedInUser,
    ) -> Result<Vec<Permission>> {
        let start = Instant::now();

        let built_in_roles = self.get_user_built_in_roles(user);
        let permissions = self.table.permissions_for(&built_in_roles);

        self.metrics.record_permissions_lookup(start.elapsed()).await;

        debug!(
            "Permissions [{}]: user={}, built_in_roles={:?}, permissions={}",
            ctx.request_id,
            user.login,
            built_in_roles,
            permissions.len()
        );

        Ok(permissions)
    }

    fn get_user_built_in_roles(&self, user: &SignedInUser) -> Vec<String> {
        self.hierarchy.built_in_roles(user)
    }
}
