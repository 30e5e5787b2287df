#![forbid(unsafe_code)]

//! JSON document formatter
//!
//! Produces a single document of the form `{"issues": [...], "errors": [...]}`
//! with each issue nesting its rule metadata and source range.

use crate::engine::{ExecutionResult, RunError};
use crate::output::jsonl::Position;
use crate::types::{Issue, Severity};
use serde::Serialize;

/// JSON formatter for check results
pub struct JsonFormatter;

impl JsonFormatter {
    /// Creates a new JsonFormatter
    pub fn new() -> Self {
        JsonFormatter
    }

    /// Format the execution result as a pretty-printed JSON document
    pub fn format(&self, result: &ExecutionResult) -> Result<String, serde_json::Error> {
        let document = Document {
            issues: result.issues.iter().map(IssueEntry::from_issue).collect(),
            errors: &result.errors,
        };
        let mut output = serde_json::to_string_pretty(&document)?;
        output.push('\n');
        Ok(output)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    issues: Vec<IssueEntry<'a>>,
    errors: &'a [RunError],
}

#[derive(Debug, Serialize)]
struct IssueEntry<'a> {
    rule: RuleEntry<'a>,
    message: &'a str,
    range: RangeEntry<'a>,
}

impl<'a> IssueEntry<'a> {
    fn from_issue(issue: &'a Issue) -> Self {
        Self {
            rule: RuleEntry {
                name: &issue.rule,
                severity: issue.severity,
                link: &issue.link,
            },
            message: &issue.message,
            range: RangeEntry {
                filename: &issue.range.filename,
                start: Position::from(issue.range.start),
                end: Position::from(issue.range.end),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RuleEntry<'a> {
    name: &'a str,
    severity: Severity,
    link: &'a str,
}

#[derive(Debug, Serialize)]
struct RangeEntry<'a> {
    filename: &'a str,
    start: Position,
    end: Position,
}
