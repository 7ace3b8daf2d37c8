//! Error types for the access control evaluator

use thiserror::Error;

/// Access control errors
///
/// A missing role or grant is never an error: it simply contributes no
/// permissions. Errors here mean the decision could not be made at all,
/// which callers must keep distinct from a denial.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A permission source failed to produce the user's permissions
    #[error("Permission source error: {0}")]
    PermissionSource(String),

    /// A permission scope could not be compiled into a matcher
    #[error("Invalid scope pattern '{pattern}': {reason}")]
    InvalidScopePattern { pattern: String, reason: String },

    /// The built-in role hierarchy contains a cycle
    #[error("Circular role hierarchy: {}", cycle.join(" -> "))]
    CircularHierarchy { cycle: Vec<String> },

    /// Permission table definition is malformed
    #[error("Invalid permission table: {0}")]
    InvalidTable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AuthzError>;
