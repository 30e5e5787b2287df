//! Initialize a tfpolicy project
//!
//! Writes a starter `.tfpolicy.toml` listing every built-in rule.

use crate::config::DEFAULT_CONFIG_FILE;
use std::fs;
use std::path::Path;

/// Default content for .tfpolicy.toml
const DEFAULT_POLICY_TOML: &str = r#"[config]
# Inspect module calls with a local source ("local") or only the root module ("none")
call_module_type = "local"

# Only run rules explicitly enabled below
disabled_by_default = false

# Report issues without failing the run
force = false

# Directories skipped by `tfpolicy check --recursive`
exclude = ["**/.terraform/**"]

[rules]
# Every rule is off until enabled here or with --enable-rule.
# Enable a rule: rule_name = true
# Configure a rule: [rules.rule_name] with enabled, severity and options

azurerm_storage_account_invalid_account_tier = false
terraform_customised_module_structure = false

[rules.azurerm_resource_missing_tags]
enabled = false
# severity = "warning"
tags = []
# resource_types = ["azurerm_resource_group", "azurerm_key_vault"]
"#;

/// Error type for init command
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of init command
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitResult {
    /// Files that were created
    pub created: Vec<String>,
    /// Files that were skipped (already existed)
    pub skipped: Vec<String>,
    /// Files that were overwritten
    pub overwritten: Vec<String>,
}

/// Run the init command in the current directory
///
/// # Arguments
/// * `force` - If true, overwrite an existing file. If false, leave it alone.
pub fn run_init(force: bool) -> Result<InitResult, InitError> {
    init_in(Path::new("."), force)
}

/// Write the starter configuration into `dir`
pub fn init_in(dir: &Path, force: bool) -> Result<InitResult, InitError> {
    let mut result = InitResult::default();
    let path = dir.join(DEFAULT_CONFIG_FILE);

    if path.exists() {
        if force {
            fs::write(&path, DEFAULT_POLICY_TOML)?;
            result.overwritten.push(DEFAULT_CONFIG_FILE.to_string());
        } else {
            result.skipped.push(DEFAULT_CONFIG_FILE.to_string());
        }
    } else {
        fs::write(&path, DEFAULT_POLICY_TOML)?;
        result.created.push(DEFAULT_CONFIG_FILE.to_string());
    }

    tracing::debug!(path = %path.display(), ?result, "init finished");
    Ok(result)
}
