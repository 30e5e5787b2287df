//! Parsing and validation for .tfpolicy.toml configuration files

use crate::error::ConfigError;
use crate::types::{GlobPattern, RuleName, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".tfpolicy.toml";

/// Main configuration struct for .tfpolicy.toml
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub config: CoreConfig,

    /// Per-rule settings keyed by rule name
    #[serde(default)]
    pub rules: BTreeMap<RuleName, RuleValue>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration from `path`, or defaults when the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.config.exclude {
            globset::Glob::new(pattern.as_str()).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid exclude glob pattern '{}': {}",
                    pattern.as_str(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Returns the settings table for `rule_name`, if one was configured
    pub fn rule_value(&self, rule_name: &str) -> Option<&RuleValue> {
        self.rules
            .iter()
            .find(|(name, _)| name.as_str() == rule_name)
            .map(|(_, value)| value)
    }

    /// Returns the free-form options configured for `rule_name`
    ///
    /// Only table-form entries carry options; the boolean shorthand yields
    /// `None`.
    pub fn rule_options(&self, rule_name: &str) -> Option<&toml::Table> {
        match self.rule_value(rule_name)? {
            RuleValue::Enabled(_) => None,
            RuleValue::Settings(settings) => Some(&settings.options),
        }
    }

    /// Returns the configured severity override for `rule_name`
    pub fn severity_override(&self, rule_name: &str) -> Option<Severity> {
        match self.rule_value(rule_name)? {
            RuleValue::Enabled(_) => None,
            RuleValue::Settings(settings) => settings.severity,
        }
    }
}

/// `[config]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Which module calls are loaded and inspected as child modules
    #[serde(default)]
    pub call_module_type: CallModuleType,

    /// When true, only rules explicitly enabled in `[rules]` run
    #[serde(default)]
    pub disabled_by_default: bool,

    /// When true, issues do not produce a failing exit code
    #[serde(default)]
    pub force: bool,

    /// Directory patterns skipped in recursive mode
    #[serde(default = "default_exclude")]
    pub exclude: Vec<GlobPattern>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            call_module_type: CallModuleType::default(),
            disabled_by_default: false,
            force: false,
            exclude: default_exclude(),
        }
    }
}

fn default_exclude() -> Vec<GlobPattern> {
    vec![GlobPattern::new("**/.terraform/**")]
}

/// Module call inspection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallModuleType {
    /// Inspect modules whose source is a local path
    #[default]
    Local,
    /// Only inspect the root module
    None,
}

/// A rule can be enabled with a boolean or configured with settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Simple boolean enable/disable
    Enabled(bool),
    /// Settings table for the rule
    Settings(RuleSettings),
}

impl RuleValue {
    /// Whether this entry turns the rule on
    ///
    /// A settings table without `enabled` counts as enabled.
    pub fn is_enabled(&self) -> bool {
        match self {
            RuleValue::Enabled(enabled) => *enabled,
            RuleValue::Settings(settings) => settings.enabled.unwrap_or(true),
        }
    }
}

/// Settings for individual rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Explicit enable/disable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Severity level override for this rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Rule-specific options, e.g. `tags = [...]`
    #[serde(flatten)]
    pub options: toml::Table,
}
