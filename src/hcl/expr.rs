//! Unevaluated attribute expressions

use crate::types::SourceRange;
use hcl_edit::expr::Expression;

/// An unevaluated expression together with its source range
///
/// Expressions come either from native HCL syntax (`.tf`) or from JSON
/// syntax (`.tf.json`).
#[derive(Debug, Clone)]
pub struct Expr {
    kind: ExprKind,
    range: SourceRange,
}

#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
    Hcl(Expression),
    Json(serde_json::Value),
}

impl Expr {
    pub fn from_hcl(expr: Expression, range: SourceRange) -> Self {
        Self {
            kind: ExprKind::Hcl(expr),
            range,
        }
    }

    pub fn from_json(value: serde_json::Value, range: SourceRange) -> Self {
        Self {
            kind: ExprKind::Json(value),
            range,
        }
    }

    /// Source range of the expression itself
    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    pub(crate) fn kind(&self) -> &ExprKind {
        &self.kind
    }
}

/// A `name = expr` assignment inside a block
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
    /// Range of the whole assignment
    pub range: SourceRange,
}
