//! Ignore annotations
//!
//! A comment of the form `# tfpolicy-ignore: rule_a, rule_b` (or with `//`)
//! suppresses issues of the named rules that start on the same line or on the
//! line directly below. The special name `all` matches every rule.
//!
//! Only real comments count: text inside string literals, templates and
//! heredocs is skipped using the spans of the parsed body.

use crate::types::SourceRange;
use hcl_edit::Span;
use hcl_edit::expr::Expression;
use hcl_edit::structure::Body;
use hcl_edit::visit::{Visit, visit_expr};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static ANNOTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:#|//)\s*tfpolicy-ignore:\s*([A-Za-z0-9_\-]+(?:\s*,\s*[A-Za-z0-9_\-]+)*)")
        .expect("annotation pattern is valid")
});

/// One ignore annotation found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub filename: String,
    /// 1-indexed line carrying the comment
    pub line: u32,
    pub rules: Vec<String>,
}

impl Annotation {
    /// Whether this annotation suppresses an issue of `rule` at `range`
    pub fn matches(&self, rule: &str, range: &SourceRange) -> bool {
        if range.filename != self.filename {
            return false;
        }
        if range.start.line != self.line && range.start.line != self.line + 1 {
            return false;
        }
        self.rules.iter().any(|name| name == rule || name == "all")
    }
}

/// Byte spans of every string-like expression in a body
#[derive(Default)]
struct StringSpans(Vec<Range<usize>>);

impl StringSpans {
    fn contains(&self, offset: usize) -> bool {
        self.0.iter().any(|span| span.contains(&offset))
    }
}

impl Visit for StringSpans {
    fn visit_expr(&mut self, expr: &Expression) {
        if matches!(
            expr,
            Expression::String(_) | Expression::StringTemplate(_) | Expression::HeredocTemplate(_)
        ) && let Some(span) = expr.span()
        {
            self.0.push(span);
        }
        visit_expr(self, expr);
    }
}

/// Scan a parsed file for ignore annotations
///
/// `body` must be the result of parsing `content`.
pub fn parse_annotations(filename: &str, content: &str, body: &Body) -> Vec<Annotation> {
    let mut strings = StringSpans::default();
    strings.visit_body(body);

    let mut annotations = Vec::new();
    let mut line_start = 0;
    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let comment = ANNOTATION_PATTERN
            .captures_iter(line)
            .find(|captures| {
                captures
                    .get(0)
                    .is_some_and(|m| !strings.contains(line_start + m.start()))
            });
        if let Some(captures) = comment {
            let rules = captures[1]
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            annotations.push(Annotation {
                filename: filename.to_string(),
                line: idx as u32 + 1,
                rules,
            });
        }
        line_start += line.len();
    }
    annotations
}
