//! Scope module for permission scope matching.
//!
//! This module provides:
//! - Glob patterns over `:`/`/` separated scopes (`folders:*`, `org:current/users:*`)
//! - Thread-safe caching of compiled patterns using DashMap
//! - Any-of matching against a list of requested scopes

mod matcher;
mod pattern;

pub use matcher::{CacheStats, ScopeConfig, ScopeMatcher};
pub use pattern::{glob_to_regex, has_wildcards, ScopePattern, SEPARATORS};
