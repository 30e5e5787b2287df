#![forbid(unsafe_code)]

//! RuleStatus output formatters
//!
//! This module provides formatters for displaying the rule set from the
//! `tfpolicy list` command. It supports both human-readable and JSONL output
//! formats.

use crate::types::Severity;
use serde::Serialize;

/// Effective status of a single rule for the current configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStatus {
    pub name: String,
    pub enabled: bool,
    /// Rule default, or the configured override
    pub severity: Severity,
    pub link: String,
}

/// Human-readable formatter for rule status
pub struct RuleStatusHumanFormatter;

impl RuleStatusHumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        RuleStatusHumanFormatter
    }

    /// Format the rule set for human consumption
    pub fn format(&self, rule_set: &str, version: &str, statuses: &[RuleStatus]) -> String {
        let enabled = statuses.iter().filter(|s| s.enabled).count();
        let mut output = String::new();

        output.push_str(&format!(
            "Rule set {} {} ({} of {} rules enabled):\n",
            rule_set,
            version,
            enabled,
            statuses.len()
        ));
        output.push('\n');

        for status in statuses {
            let state = if status.enabled { "enabled" } else { "disabled" };
            output.push_str(&format!("{} ({})\n", status.name, state));
            output.push_str(&format!("  Severity: {}\n", status.severity));
            if !status.link.is_empty() {
                output.push_str(&format!("  Link: {}\n", status.link));
            }
            output.push('\n');
        }

        output
    }
}

impl Default for RuleStatusHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// JSONL formatter for rule status
pub struct RuleStatusJsonlFormatter;

impl RuleStatusJsonlFormatter {
    /// Create a new JSONL formatter
    pub fn new() -> Self {
        RuleStatusJsonlFormatter
    }

    /// Format the rule set as JSONL
    ///
    /// Returns a string with one JSON object per line for each rule.
    pub fn format(&self, statuses: &[RuleStatus]) -> String {
        let mut output = String::new();

        for status in statuses {
            match serde_json::to_string(status) {
                Ok(json) => {
                    output.push_str(&json);
                    output.push('\n');
                }
                Err(e) => tracing::warn!(rule = %status.name, error = %e, "failed to serialize rule status"),
            }
        }

        output
    }
}

impl Default for RuleStatusJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}
