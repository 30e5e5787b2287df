//! Check command implementation
//!
//! This module implements the `tfpolicy check` command, which:
//! - Loads configuration from .tfpolicy.toml
//! - Resolves the enabled rules
//! - Discovers module directories (one, or every one below PATH)
//! - Executes all enabled rules, in parallel across modules
//! - Formats output (human, JSONL or JSON)
//! - Returns appropriate exit code

use crate::cli::args::{CheckArgs, ColorChoice, OutputFormat};
use crate::cli::common::{
    EXIT_ERROR, EXIT_ISSUES, EXIT_PARSE_ERROR, EXIT_SUCCESS, load_config, stderr_color,
    stdout_color,
};
use crate::engine::{ExecutionEngine, ExecutionResult, ModuleWalker};
use crate::error::{ConfigError, LoadError};
use crate::output::{HumanFormatter, JsonFormatter, JsonlFormatter};
use crate::rules::{RuleOverrides, RuleSet};
use crate::types::Severity;
use std::io::Write;
use termcolor::StandardStream;

/// Error type specific to check command
#[derive(Debug, thiserror::Error)]
pub(crate) enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the check command
///
/// # Returns
///
/// Exit code:
/// - 0: No issue at or above the minimum failure severity (or `--force`)
/// - 1: One or more failing issues
/// - 2: Error (configuration, I/O, module loading or rule failure)
/// - 3: Parse error (invalid TOML or Terraform syntax)
pub fn run_check(args: &CheckArgs, color: ColorChoice) -> i32 {
    match run_check_inner(args, color) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                CheckError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                _ => EXIT_ERROR,
            }
        }
    }
}

/// Internal implementation of check command
fn run_check_inner(args: &CheckArgs, color: ColorChoice) -> Result<i32, CheckError> {
    let config = load_config(args.config.as_deref())?;
    let force = args.force || config.config.force;
    let exclude = config.config.exclude.clone();

    let overrides = RuleOverrides {
        enable: args.enable_rules.clone(),
        disable: args.disable_rules.clone(),
    };
    let engine = ExecutionEngine::new(RuleSet::builtin(), config, &overrides)?;

    if engine.enabled_rules().next().is_none() && args.format == OutputFormat::Human {
        eprintln!("Warning: No rules are enabled. Enable rules in .tfpolicy.toml or with --enable-rule.");
    }

    let module_dirs = if args.recursive {
        ModuleWalker::new(&args.path, &exclude)?.discover()?
    } else {
        vec![args.path.clone()]
    };
    tracing::debug!(modules = module_dirs.len(), "checking modules");

    let result = engine.execute(&module_dirs);
    let code = exit_code(&result, args.minimum_failure_severity, force);

    match args.format {
        OutputFormat::Human => print_human_output(&result, color)?,
        OutputFormat::Jsonl => {
            let output = JsonlFormatter::new().format(&result, code == EXIT_SUCCESS);
            print!("{}", output);
        }
        OutputFormat::Json => print!("{}", JsonFormatter::new().format(&result)?),
    }

    Ok(code)
}

/// Exit code for a finished run
///
/// Parse errors win over other errors, which win over issues.
pub(crate) fn exit_code(result: &ExecutionResult, minimum: Severity, force: bool) -> i32 {
    if result.has_parse_errors() {
        EXIT_PARSE_ERROR
    } else if !result.errors.is_empty() {
        EXIT_ERROR
    } else if !force && result.failing_issues(minimum).next().is_some() {
        EXIT_ISSUES
    } else {
        EXIT_SUCCESS
    }
}

/// Print issues to stdout and run errors to stderr
fn print_human_output(result: &ExecutionResult, color: ColorChoice) -> std::io::Result<()> {
    let formatter = HumanFormatter::new();

    let mut stdout = StandardStream::stdout(stdout_color(color));
    formatter.write_issues(&mut stdout, result)?;
    stdout.flush()?;

    let mut stderr = StandardStream::stderr(stderr_color(color));
    formatter.write_errors(&mut stderr, &result.errors)?;
    stderr.flush()
}
