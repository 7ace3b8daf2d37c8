//! Access control configuration loading

use crate::error::{AuthzError, Result};
use crate::roles::PermissionTable;
use crate::scope::ScopeConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Feature toggle that turns access control on
pub const FEATURE_TOGGLE_ACCESSCONTROL: &str = "accesscontrol";

/// Environment variable overriding the enabled feature toggles
pub const FEATURE_TOGGLES_ENV: &str = "ACCESSCONTROL_FEATURE_TOGGLES_ENABLE";

/// Complete access control configuration
///
/// ```toml
/// permission_table = "/etc/accesscontrol/roles.json"
///
/// [feature_toggles]
/// enable = ["accesscontrol"]
///
/// [scope]
/// allow_wildcards = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessControlConfig {
    #[serde(default)]
    pub feature_toggles: FeatureToggles,

    #[serde(default)]
    pub scope: ScopeConfig,

    /// JSON permission table replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_table: Option<PathBuf>,
}

/// Enabled feature toggles
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeatureToggles {
    /// Toggle names, given as a list or a comma/space separated string
    #[serde(default, deserialize_with = "deserialize_toggle_list")]
    pub enable: Vec<String>,
}

impl FeatureToggles {
    /// Build from toggle names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enable: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a toggle is present
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enable.iter().any(|t| t == name)
    }
}

fn split_toggles(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_toggle_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ToggleList {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match ToggleList::deserialize(deserializer)? {
        ToggleList::List(list) => list,
        ToggleList::Joined(raw) => split_toggles(&raw),
    })
}

impl AccessControlConfig {
    /// Configuration with only the given feature toggles enabled
    pub fn with_toggles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_toggles: FeatureToggles::new(names),
            ..Self::default()
        }
    }

    /// Configuration with access control switched on
    pub fn enabled() -> Self {
        Self::with_toggles([FEATURE_TOGGLE_ACCESSCONTROL])
    }

    /// Load configuration from a TOML or JSON file (chosen by extension)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents)?,
            Some("toml") | None => Self::from_toml_str(&contents)?,
            Some(other) => {
                return Err(AuthzError::Config(format!(
                    "unsupported configuration format '{}'",
                    other
                )))
            }
        };

        info!("Loaded access control configuration from {:?}", path);
        Ok(config)
    }

    /// Parse TOML configuration
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse JSON configuration
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(FEATURE_TOGGLES_ENV) {
            let toggles = split_toggles(&raw);
            debug!("Feature toggles overridden from {}: {:?}", FEATURE_TOGGLES_ENV, toggles);
            self.feature_toggles.enable = toggles;
        }
    }

    /// Whether access control is switched on
    pub fn accesscontrol_enabled(&self) -> bool {
        self.feature_toggles.is_enabled(FEATURE_TOGGLE_ACCESSCONTROL)
    }

    /// Permission table named by the configuration, or the built-in one
    pub fn load_permission_table(&self) -> Result<PermissionTable> {
        match &self.permission_table {
            Some(path) => PermissionTable::load(path),
            None => Ok(PermissionTable::builtin()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scope.max_cache_size == 0 {
            return Err(AuthzError::Config(
                "scope.max_cache_size must be greater than zero".to_string(),
            ));
        }
        if self.feature_toggles.enable.iter().any(|t| t.trim().is_empty()) {
            return Err(AuthzError::Config(
                "feature toggle names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_disabled() {
        let config = AccessControlConfig::default();
        assert!(!config.accesscontrol_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_list() {
        let config = AccessControlConfig::from_toml_str(
            r#"
            [feature_toggles]
            enable = ["accesscontrol", "ngalert"]
            "#,
        )
        .unwrap();

        assert!(config.accesscontrol_enabled());
        assert!(config.feature_toggles.is_enabled("ngalert"));
        assert!(config.scope.allow_wildcards);
    }

    #[test]
    fn test_toml_joined_string() {
        let config = AccessControlConfig::from_toml_str(
            r#"
            [feature_toggles]
            enable = "ngalert, accesscontrol"
            "#,
        )
        .unwrap();

        assert_eq!(config.feature_toggles.enable, vec!["ngalert", "accesscontrol"]);
    }

    #[test]
    fn test_json_config() {
        let config = AccessControlConfig::from_json_str(
            r#"{"feature_toggles": {"enable": ["accesscontrol"]}, "scope": {"allow_wildcards": false}}"#,
        )
        .unwrap();

        assert!(config.accesscontrol_enabled());
        assert!(!config.scope.allow_wildcards);
        assert_eq!(config.scope.max_cache_size, 10_000);
    }

    #[test]
    fn test_env_override_replaces_toggles() {
        let mut config = AccessControlConfig::with_toggles(["ngalert"]);
        config.apply_overrides_from(|key| {
            (key == FEATURE_TOGGLES_ENV).then(|| "accesscontrol live".to_string())
        });

        assert_eq!(config.feature_toggles.enable, vec!["accesscontrol", "live"]);
        assert!(config.accesscontrol_enabled());
    }

    #[test]
    fn test_env_override_absent_keeps_config() {
        let mut config = AccessControlConfig::enabled();
        config.apply_overrides_from(|_| None);
        assert!(config.accesscontrol_enabled());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[feature_toggles]\nenable = [\"accesscontrol\"]").unwrap();

        let config = AccessControlConfig::load(file.path()).unwrap();
        assert!(config.accesscontrol_enabled());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = AccessControlConfig::load(file.path());
        assert!(matches!(result, Err(AuthzError::Config(_))));
    }

    #[test]
    fn test_builtin_table_when_unset() {
        let config = AccessControlConfig::default();
        assert_eq!(config.load_permission_table().unwrap(), PermissionTable::builtin());
    }

    #[test]
    fn test_validate_rejects_zero_cache() {
        let mut config = AccessControlConfig::enabled();
        config.scope.max_cache_size = 0;
        assert!(matches!(config.validate(), Err(AuthzError::Config(_))));
    }
}
