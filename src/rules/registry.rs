#![forbid(unsafe_code)]

//! The rule set exposed to the host
//!
//! The RuleSet is responsible for:
//! - Registering the built-in rules
//! - Rejecting configuration that names unknown rules
//! - Resolving which rules are enabled for a run
//! - Providing access to rules by name

use crate::config::Config;
use crate::error::ConfigError;
use crate::rules::{InvalidAccountTierRule, MissingTagsRule, ModuleStructureRule, Rule};

/// Name reported for the built-in rule set
pub const RULE_SET_NAME: &str = "custom";

/// Enable/disable requests given on the command line
///
/// These win over the configuration file. A rule named in both lists is
/// disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOverrides {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

/// A named, versioned list of rules
///
/// Rules keep their registration order, which is also the order they run in
/// and the order `list` prints them.
pub struct RuleSet {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            rules: Vec::new(),
        }
    }

    /// The rule set shipped with this crate
    pub fn builtin() -> Self {
        let mut set = Self::new(RULE_SET_NAME, env!("CARGO_PKG_VERSION"));
        set.register(Box::new(MissingTagsRule::new()));
        set.register(Box::new(InvalidAccountTierRule::new()));
        set.register(Box::new(ModuleStructureRule::new()));
        set
    }

    /// Add a rule, replacing any rule registered under the same name
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            tracing::warn!(rule = rule.name(), "replacing rule registered twice");
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get a rule by its name
    pub fn get_rule(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .map(|boxed| boxed.as_ref())
    }

    /// Iterate over all rules in registration order
    pub fn iter_rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|boxed| boxed.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fail if `config` configures a rule this set does not contain
    pub fn validate_config(&self, config: &Config) -> Result<(), ConfigError> {
        for name in config.rules.keys() {
            self.require(name.as_str())?;
        }
        Ok(())
    }

    /// Whether `rule` runs under `config` and `overrides`
    ///
    /// Precedence, highest first: command line, `[rules]` entry,
    /// `disabled_by_default`, the rule's own default.
    pub fn is_enabled(&self, rule: &dyn Rule, config: &Config, overrides: &RuleOverrides) -> bool {
        let name = rule.name();
        if overrides.disable.iter().any(|n| n == name) {
            return false;
        }
        if overrides.enable.iter().any(|n| n == name) {
            return true;
        }
        if let Some(value) = config.rule_value(name) {
            return value.is_enabled();
        }
        if config.config.disabled_by_default {
            return false;
        }
        rule.enabled()
    }

    /// Rules that run under `config` and `overrides`, in registration order
    pub fn enabled_rules(
        &self,
        config: &Config,
        overrides: &RuleOverrides,
    ) -> Result<Vec<&dyn Rule>, ConfigError> {
        self.validate_config(config)?;
        for name in overrides.enable.iter().chain(&overrides.disable) {
            self.require(name)?;
        }

        let enabled: Vec<&dyn Rule> = self
            .iter_rules()
            .filter(|rule| self.is_enabled(*rule, config, overrides))
            .collect();

        tracing::debug!(
            enabled = enabled.len(),
            total = self.len(),
            "resolved enabled rules"
        );
        Ok(enabled)
    }

    fn require(&self, name: &str) -> Result<(), ConfigError> {
        match self.get_rule(name) {
            Some(_) => Ok(()),
            None => Err(ConfigError::UnknownRule(name.to_string())),
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("version", &self.version)
            .field(
                "rules",
                &self.iter_rules().map(|rule| rule.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
