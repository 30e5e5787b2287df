#![forbid(unsafe_code)]

//! Human-readable output formatter
//!
//! Each issue is printed as a block headed by its severity, followed by the
//! location and, when the rule has one, its documentation link. Severity
//! labels are coloured through `termcolor`, so colour handling follows the
//! writer the caller passes in.

use crate::engine::{ExecutionResult, RunError};
use crate::types::{Issue, Severity};
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, NoColor, WriteColor};

/// Human-readable formatter for check results
pub struct HumanFormatter;

impl HumanFormatter {
    /// Creates a new HumanFormatter
    pub fn new() -> Self {
        HumanFormatter
    }

    /// Write all issues of `result` to `out`
    ///
    /// Nothing is written when there are no issues.
    pub fn write_issues(&self, out: &mut dyn WriteColor, result: &ExecutionResult) -> io::Result<()> {
        if result.issues.is_empty() {
            return Ok(());
        }

        writeln!(out, "{} issue(s) found:", result.issues.len())?;
        writeln!(out)?;
        for issue in &result.issues {
            self.write_issue(out, issue)?;
        }
        Ok(())
    }

    /// Write one line per run error to `out`
    pub fn write_errors(&self, out: &mut dyn WriteColor, errors: &[RunError]) -> io::Result<()> {
        for error in errors {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "Failed to check")?;
            out.reset()?;
            writeln!(out, " {}", error)?;
        }
        Ok(())
    }

    /// Format issues without colour
    pub fn format(&self, result: &ExecutionResult) -> String {
        let mut out = NoColor::new(Vec::new());
        // Writing into a Vec cannot fail
        let _ = self.write_issues(&mut out, result);
        String::from_utf8_lossy(&out.into_inner()).into_owned()
    }

    fn write_issue(&self, out: &mut dyn WriteColor, issue: &Issue) -> io::Result<()> {
        out.set_color(&severity_color(issue.severity))?;
        write!(out, "{}:", issue.severity.label())?;
        out.reset()?;
        writeln!(out, " {} ({})", issue.message, issue.rule)?;
        writeln!(out)?;
        writeln!(
            out,
            "  on {} line {}, column {}",
            issue.range.filename, issue.range.start.line, issue.range.start.column
        )?;
        writeln!(out)?;
        if !issue.link.is_empty() {
            writeln!(out, "Reference: {}", issue.link)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_color(severity: Severity) -> ColorSpec {
    let color = match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Notice => Color::Green,
    };
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    spec
}
