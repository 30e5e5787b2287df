#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. All issue records (sorted by file, line, column, rule)
//! 2. All error records, in the order they were recorded
//! 3. One status record

use crate::engine::{ExecutionResult, RunError};
use crate::types::{Issue, Pos, Severity};
use serde::Serialize;

/// JSONL output formatter
///
/// Formats execution results as JSON Lines (one JSON object per line).
pub struct JsonlFormatter;

impl JsonlFormatter {
    /// Creates a new JsonlFormatter
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format the execution result as JSONL
    ///
    /// `passed` is the overall outcome reported in the status record.
    pub fn format(&self, result: &ExecutionResult, passed: bool) -> String {
        let mut output = String::new();

        let mut issues: Vec<&Issue> = result.issues.iter().collect();
        issues.sort_by(|a, b| {
            a.range
                .filename
                .cmp(&b.range.filename)
                .then_with(|| a.range.start.cmp(&b.range.start))
                .then_with(|| a.rule.cmp(&b.rule))
        });

        for issue in issues {
            push_line(&mut output, &IssueRecord::from_issue(issue));
        }

        for error in &result.errors {
            push_line(
                &mut output,
                &ErrorRecord {
                    record_type: "error",
                    error,
                },
            );
        }

        push_line(
            &mut output,
            &StatusRecord {
                record_type: "status",
                passed,
                modules_checked: result.modules_checked as u64,
                rules_executed: result.rules_executed as u64,
                total_issues: result.issues.len() as u64,
                total_errors: result.errors.len() as u64,
            },
        );

        output
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line<T: Serialize>(output: &mut String, record: &T) {
    match serde_json::to_string(record) {
        Ok(json) => {
            output.push_str(&json);
            output.push('\n');
        }
        Err(e) => tracing::warn!(error = %e, "failed to serialize record"),
    }
}

/// Issue record for JSONL output
#[derive(Debug, Serialize)]
struct IssueRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    rule: &'a str,
    severity: Severity,
    message: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    link: &'a str,
    file: &'a str,
    start: Position,
    end: Position,
}

impl<'a> IssueRecord<'a> {
    fn from_issue(issue: &'a Issue) -> Self {
        Self {
            record_type: "issue",
            rule: &issue.rule,
            severity: issue.severity,
            message: &issue.message,
            link: &issue.link,
            file: &issue.range.filename,
            start: Position::from(issue.range.start),
            end: Position::from(issue.range.end),
        }
    }
}

/// Line and column of a position, both 1-indexed
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct Position {
    pub line: u32,
    pub column: u32,
}

impl From<Pos> for Position {
    fn from(pos: Pos) -> Self {
        Position {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// Error record for JSONL output
#[derive(Debug, Serialize)]
struct ErrorRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    #[serde(flatten)]
    error: &'a RunError,
}

/// Status record for JSONL output
#[derive(Debug, Serialize)]
struct StatusRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    passed: bool,
    modules_checked: u64,
    rules_executed: u64,
    total_issues: u64,
    total_errors: u64,
}
