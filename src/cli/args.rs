//! CLI argument parsing using clap

use crate::types::Severity;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for tfpolicy commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
    /// A single JSON document
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// tfpolicy CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "tfpolicy")]
#[command(about = "Policy lint rules for Terraform configuration")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Output coloring
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Available tfpolicy subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check Terraform modules against the enabled rules
    Check(CheckArgs),

    /// Create a starter .tfpolicy.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the rule set and which rules are enabled
    List {
        /// Output format
        #[arg(short, long, default_value = "human")]
        format: OutputFormat,

        /// Configuration file (defaults to .tfpolicy.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Arguments of `tfpolicy check`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    /// Module directory to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Check every module directory below PATH
    #[arg(long)]
    pub recursive: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Configuration file (defaults to .tfpolicy.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable a rule regardless of configuration
    #[arg(long = "enable-rule", value_name = "RULE")]
    pub enable_rules: Vec<String>,

    /// Disable a rule regardless of configuration
    #[arg(long = "disable-rule", value_name = "RULE")]
    pub disable_rules: Vec<String>,

    /// Lowest severity that makes the check fail
    #[arg(long, value_name = "SEVERITY", default_value = "notice")]
    pub minimum_failure_severity: Severity,

    /// Exit with 0 even when issues are found
    #[arg(long)]
    pub force: bool,
}
