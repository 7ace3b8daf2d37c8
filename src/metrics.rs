//! Usage statistics and evaluation metrics
//!
//! Nothing here affects decisions. The service reports through these types
//! so that deployments can observe it, and tests can substitute their own
//! [`UsageStats`] implementation.

use crate::error::Result;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

/// Usage metric reporting whether access control is enabled (0 or 1)
pub const METRIC_ACCESSCONTROL_ENABLED: &str = "stats.oss.accesscontrol.enabled.count";

/// Callback producing the current value of a usage metric
pub type MetricCollector = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// Registry of usage metrics reported by services
pub trait UsageStats: Send + Sync {
    /// Register a named usage metric
    fn register_metric(&self, name: &str, collector: MetricCollector);
}

/// In-memory usage statistics registry
#[derive(Default)]
pub struct InMemoryUsageStats {
    metrics: Mutex<IndexMap<String, MetricCollector>>,
}

impl InMemoryUsageStats {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of registered metrics in registration order
    pub fn names(&self) -> Vec<String> {
        self.metrics.lock().keys().cloned().collect()
    }

    /// Collect current values of all registered metrics
    ///
    /// A metric whose collector fails is logged and left out of the report.
    pub fn collect(&self) -> IndexMap<String, Value> {
        let metrics = self.metrics.lock();
        let mut report = IndexMap::with_capacity(metrics.len());

        for (name, collector) in metrics.iter() {
            match collector() {
                Ok(value) => {
                    report.insert(name.clone(), value);
                }
                Err(e) => warn!("Failed to collect usage metric {}: {}", name, e),
            }
        }

        report
    }
}

impl UsageStats for InMemoryUsageStats {
    fn register_metric(&self, name: &str, collector: MetricCollector) {
        self.metrics.lock().insert(name.to_string(), collector);
    }
}

/// Snapshot of evaluation metrics
#[derive(Debug, Clone, Default)]
pub struct AccessMetrics {
    /// Calls to fetch user permissions
    pub permission_lookups: u64,

    /// Evaluations that granted access
    pub allowed_evaluations: u64,

    /// Evaluations that denied access
    pub denied_evaluations: u64,

    /// Evaluations that failed with an error
    pub failed_evaluations: u64,

    /// Permission lookup latency percentiles
    pub latency_p50_ms: f64,
    pub latency_p90_ms: f64,
    pub latency_p99_ms: f64,

    /// Average permission lookup latency
    pub avg_latency_ms: f64,
}

impl AccessMetrics {
    /// Share of completed evaluations that granted access
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_evaluations + self.denied_evaluations;
        if total == 0 {
            0.0
        } else {
            self.allowed_evaluations as f64 / total as f64
        }
    }
}

/// Collects permission lookup timings and evaluation outcomes
///
/// Recording only bumps counters and appends to a bounded sample window.
/// Percentiles and averages are computed when a snapshot is taken.
pub struct MetricsCollector {
    permission_lookups: AtomicU64,
    allowed_evaluations: AtomicU64,
    denied_evaluations: AtomicU64,
    failed_evaluations: AtomicU64,

    /// Most recent lookup latencies in milliseconds, oldest first
    latency_samples: RwLock<VecDeque<f64>>,

    max_samples: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::with_max_samples(10_000)
    }

    /// Create a collector keeping at most `max_samples` latency samples
    pub fn with_max_samples(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            permission_lookups: AtomicU64::new(0),
            allowed_evaluations: AtomicU64::new(0),
            denied_evaluations: AtomicU64::new(0),
            failed_evaluations: AtomicU64::new(0),
            latency_samples: RwLock::new(VecDeque::with_capacity(max_samples.min(10_000))),
            max_samples,
        }
    }

    /// Record the duration of one permission lookup
    pub async fn record_permissions_lookup(&self, latency: Duration) {
        self.permission_lookups.fetch_add(1, Ordering::Relaxed);

        let mut samples = self.latency_samples.write().await;
        if samples.len() == self.max_samples {
            samples.pop_front();
        }
        samples.push_back(latency.as_secs_f64() * 1000.0);
    }

    /// Record the outcome of one evaluation
    pub async fn record_evaluation(&self, outcome: &Result<bool>) {
        let counter = match outcome {
            Ok(true) => &self.allowed_evaluations,
            Ok(false) => &self.denied_evaluations,
            Err(_) => &self.failed_evaluations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> AccessMetrics {
        let mut sorted: Vec<f64> = self.latency_samples.read().await.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        AccessMetrics {
            permission_lookups: self.permission_lookups.load(Ordering::Relaxed),
            allowed_evaluations: self.allowed_evaluations.load(Ordering::Relaxed),
            denied_evaluations: self.denied_evaluations.load(Ordering::Relaxed),
            failed_evaluations: self.failed_evaluations.load(Ordering::Relaxed),
            latency_p50_ms: Self::percentile(&sorted, 0.50),
            latency_p90_ms: Self::percentile(&sorted, 0.90),
            latency_p99_ms: Self::percentile(&sorted, 0.99),
            avg_latency_ms: if sorted.is_empty() {
                0.0
            } else {
                sorted.iter().sum::<f64>() / sorted.len() as f64
            },
        }
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        self.permission_lookups.store(0, Ordering::Relaxed);
        self.allowed_evaluations.store(0, Ordering::Relaxed);
        self.denied_evaluations.store(0, Ordering::Relaxed);
        self.failed_evaluations.store(0, Ordering::Relaxed);
        self.latency_samples.write().await.clear();
    }

    /// Export metrics in Prometheus text format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.snapshot().await;

        format!(
            r#"# HELP accesscontrol_permissions_duration_seconds Time spent resolving user permissions
# TYPE accesscontrol_permissions_duration_seconds summary
accesscontrol_permissions_duration_seconds{{quantile="0.5"}} {}
accesscontrol_permissions_duration_seconds{{quantile="0.9"}} {}
accesscontrol_permissions_duration_seconds{{quantile="0.99"}} {}
accesscontrol_permissions_duration_seconds_count {}

# HELP accesscontrol_evaluations_total Access control evaluations by result
# TYPE accesscontrol_evaluations_total counter
accesscontrol_evaluations_total{{result="allowed"}} {}
accesscontrol_evaluations_total{{result="denied"}} {}
accesscontrol_evaluations_total{{result="error"}} {}
"#,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p90_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
            metrics.permission_lookups,
            metrics.allowed_evaluations,
            metrics.denied_evaluations,
            metrics.failed_evaluations,
        )
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = ((sorted.len() as f64) * p) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
