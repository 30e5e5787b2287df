//! Error types for tfpolicy
//!
//! Errors are split by the layer that produces them. Policy violations are
//! never errors; they are reported as [`crate::types::Issue`] values.

use std::path::PathBuf;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML syntax or shape
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid configuration
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// A `[rules]` entry names a rule that is not part of the rule set
    #[error("Rule not found: {0}")]
    UnknownRule(String),

    /// Rule-specific options could not be decoded
    #[error("Invalid options for rule {rule}: {message}")]
    InvalidOptions { rule: String, message: String },
}

/// Structural failures raised while a rule queries configuration
///
/// Any of these aborts the current rule's check for the module being
/// inspected.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The requested schema is malformed
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The configuration does not fit the requested schema
    #[error("Schema mismatch in {resource}: {message}")]
    SchemaMismatch { resource: String, message: String },

    /// The rule's configuration block is invalid
    #[error("Rule configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to statically evaluate a single expression
///
/// These are isolated to the item being evaluated; see
/// [`crate::runner::ensure_no_error`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The value depends on something only known at apply time
    #[error("value is unknown: {0}")]
    Unknown(String),

    /// The value is null
    #[error("value is null")]
    Null,

    /// The value cannot be converted to the requested shape
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The expression uses syntax the static evaluator does not support
    #[error("unsupported expression: {0}")]
    Unsupported(String),
}

/// Errors raised while loading a module from disk or memory
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File or directory could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Syntax error in a configuration file
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// A local module call points somewhere that cannot be loaded
    #[error("Invalid module source {source_path} in {file}: {message}")]
    InvalidModuleSource {
        file: String,
        source_path: String,
        message: String,
    },

    /// An exclude pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    /// Directory walk failed in recursive mode
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Top-level error type for tfpolicy
#[derive(Debug, thiserror::Error)]
pub enum TfPolicyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Module loading error
    #[error("{0}")]
    Load(#[from] LoadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TfPolicyError {
    /// Whether this error originates from a syntax error in a config file
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            TfPolicyError::Load(LoadError::Parse { .. })
                | TfPolicyError::Config(ConfigError::Parse(_))
        )
    }
}
