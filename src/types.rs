#![forbid(unsafe_code)]

//! Core domain types for tfpolicy
//!
//! This module defines the fundamental types shared by the rules, the runner
//! and the output formatters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue severity levels
///
/// Ordered from least to most severe so that `--minimum-failure-severity`
/// can be expressed as a plain comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl Severity {
    /// Returns the lowercase name used in configuration and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Returns the capitalised label used by the human formatter
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Notice => "Notice",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "notice" => Ok(Severity::Notice),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!(
                "unknown severity '{}', expected one of: error, warning, notice",
                other
            )),
        }
    }
}

/// A validated rule name
///
/// Rule names must be non-empty and contain only alphanumeric characters,
/// hyphens, and underscores. They double as configuration keys and as the
/// identifiers used in ignore annotations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleName(String);

impl RuleName {
    /// Creates a new RuleName, validating the input
    ///
    /// Returns None if the input is empty or contains invalid characters
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(RuleName(name))
    }

    /// Returns the rule name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RuleName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RuleName::new(value.clone()).ok_or_else(|| format!("Invalid rule name '{}'", value))
    }
}

impl From<RuleName> for String {
    fn from(rule_name: RuleName) -> Self {
        rule_name.0
    }
}

/// A position in a source file
///
/// Lines and columns are 1-indexed; columns count characters, not bytes.
/// `byte` is the 0-indexed byte offset into the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
    pub byte: usize,
}

impl Pos {
    /// The first position of any file
    pub const INITIAL: Pos = Pos {
        line: 1,
        column: 1,
        byte: 0,
    };

    pub fn new(line: u32, column: u32, byte: usize) -> Self {
        Pos { line, column, byte }
    }
}

/// A span of source text, end exclusive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: Pos,
    pub end: Pos,
}

impl SourceRange {
    pub fn new(filename: impl Into<String>, start: Pos, end: Pos) -> Self {
        SourceRange {
            filename: filename.into(),
            start,
            end,
        }
    }

    /// A zero-width range at the start of `filename`
    ///
    /// Used for whole-file diagnostics and for declarations that carry no
    /// span information (JSON syntax).
    pub fn file_start(filename: impl Into<String>) -> Self {
        SourceRange::new(filename, Pos::INITIAL, Pos::INITIAL)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// A glob pattern for path matching
///
/// This is a simple wrapper around a string that will be used with the `globset` crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobPattern(String);

impl GlobPattern {
    /// Creates a new GlobPattern
    pub fn new(pattern: impl Into<String>) -> Self {
        GlobPattern(pattern.into())
    }

    /// Returns the pattern as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        GlobPattern(pattern.to_string())
    }
}

/// A single policy violation reported by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Name of the rule that emitted this issue
    pub rule: String,

    /// Effective severity (rule default or configured override)
    pub severity: Severity,

    /// Documentation link of the emitting rule, may be empty
    pub link: String,

    /// Human-readable message
    pub message: String,

    /// Where the violation was found
    pub range: SourceRange,
}
