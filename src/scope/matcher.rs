//! Scope matching with a compiled pattern cache

use super::pattern::ScopePattern;
use crate::error::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for scope matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Interpret `*`, `**` and `?` in permission scopes
    #[serde(default = "default_true")]
    pub allow_wildcards: bool,

    /// Maximum number of compiled patterns kept in memory
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_cache_size() -> usize {
    10_000
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            allow_wildcards: true,
            max_cache_size: default_max_cache_size(),
        }
    }
}

/// Pattern cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Matches requested scopes against permission scope patterns
///
/// Compiled patterns are kept in a `DashMap` keyed by pattern text, so the
/// matcher can be shared across threads. The permission table is small and
/// fixed, so the cache converges to one entry per distinct scope.
///
/// # Examples
///
/// ```
/// use accesscontrol::scope::{ScopeConfig, ScopeMatcher};
///
/// let matcher = ScopeMatcher::new(ScopeConfig::default());
///
/// assert!(matcher.matches("folders:*", "folders:7").unwrap());
/// assert!(!matcher.matches("folders:*", "folders:7:panels").unwrap());
/// assert!(matcher.matches_any("users:*", &["teams:1", "users:42"]).unwrap());
/// ```
pub struct ScopeMatcher {
    config: ScopeConfig,
    cache: DashMap<String, Arc<ScopePattern>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl ScopeMatcher {
    /// Creates a matcher with the given configuration
    pub fn new(config: ScopeConfig) -> Self {
        Self {
            config,
            cache: DashMap::new(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Returns the matcher configuration
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Returns the compiled form of a permission scope
    pub fn compile(&self, pattern: &str) -> Result<Arc<ScopePattern>> {
        if let Some(entry) = self.cache.get(pattern) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(entry.value()));
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let compiled = if self.config.allow_wildcards {
            Arc::new(ScopePattern::compile(pattern)?)
        } else {
            Arc::new(ScopePattern::literal(pattern))
        };

        if self.cache.len() >= self.config.max_cache_size {
            self.cache.clear();
        }
        self.cache.insert(pattern.to_string(), Arc::clone(&compiled));

        Ok(compiled)
    }

    /// Check one requested scope against a permission scope
    pub fn matches(&self, pattern: &str, scope: &str) -> Result<bool> {
        if pattern == scope {
            return Ok(true);
        }
        Ok(self.compile(pattern)?.matches(scope))
    }

    /// Check whether a permission scope matches any requested scope
    pub fn matches_any<S: AsRef<str>>(&self, pattern: &str, scopes: &[S]) -> Result<bool> {
        if scopes.is_empty() {
            return Ok(false);
        }
        let compiled = self.compile(pattern)?;
        Ok(scopes.iter().any(|s| compiled.matches(s.as_ref())))
    }

    /// Clears compiled patterns and resets statistics
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            size: self.cache.len(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for ScopeMatcher {
    fn default() -> Self {
        Self::new(ScopeConfig::default())
    }
}
