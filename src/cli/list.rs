//! List command implementation
//!
//! This module implements the `tfpolicy list` command, which shows every rule
//! of the rule set with its effective state under the current configuration:
//! enabled or not, severity (after overrides) and documentation link.

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, load_config};
use crate::config::Config;
use crate::error::ConfigError;
use crate::output::{RuleStatus, RuleStatusHumanFormatter, RuleStatusJsonlFormatter};
use crate::rules::{RuleOverrides, RuleSet};
use std::path::Path;

/// Error type specific to list command
#[derive(Debug, thiserror::Error)]
enum ListError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run the list command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: Error
/// - 3: Invalid TOML configuration
pub fn run_list(format: OutputFormat, config_path: Option<&Path>) -> i32 {
    match run_list_inner(format, config_path) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                ListError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                _ => EXIT_ERROR,
            }
        }
    }
}

fn run_list_inner(format: OutputFormat, config_path: Option<&Path>) -> Result<(), ListError> {
    let config = load_config(config_path)?;
    let rule_set = RuleSet::builtin();
    let statuses = build_rule_statuses(&rule_set, &config)?;

    match format {
        OutputFormat::Human => {
            let formatter = RuleStatusHumanFormatter::new();
            print!(
                "{}",
                formatter.format(rule_set.name(), rule_set.version(), &statuses)
            );
        }
        OutputFormat::Jsonl => {
            print!("{}", RuleStatusJsonlFormatter::new().format(&statuses));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
    }

    Ok(())
}

/// Effective status of every rule in `rule_set`, in registration order
fn build_rule_statuses(rule_set: &RuleSet, config: &Config) -> Result<Vec<RuleStatus>, ConfigError> {
    rule_set.validate_config(config)?;
    let overrides = RuleOverrides::default();

    Ok(rule_set
        .iter_rules()
        .map(|rule| RuleStatus {
            name: rule.name().to_string(),
            enabled: rule_set.is_enabled(rule, config, &overrides),
            severity: config
                .severity_override(rule.name())
                .unwrap_or_else(|| rule.severity()),
            link: rule.link().to_string(),
        })
        .collect())
}
