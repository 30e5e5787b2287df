#![forbid(unsafe_code)]

//! tfpolicy: policy lint rules for Terraform configuration
//!
//! tfpolicy loads Terraform modules, evaluates what it can statically, and
//! runs a small rule set over them: required resource tags, valid storage
//! account tiers, and a customised module file layout.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod hcl;
pub mod output;
pub mod rules;
pub mod runner;
pub mod types;

// Re-export error types for convenient access
pub use error::{ConfigError, EvalError, LoadError, RuleError, TfPolicyError};

// Re-export core domain types for convenient access
pub use types::{GlobPattern, Issue, Pos, RuleName, Severity, SourceRange};
