//! Static expression evaluation
//!
//! Resolves what can be known without running Terraform: literals, arrays,
//! objects, string templates, conditionals, and references to input variables
//! and local values. Anything else (resource attributes, data sources,
//! function calls, operators) is reported as an [`EvalError`] so callers can
//! skip the item instead of guessing.

use crate::error::EvalError;
use crate::hcl::expr::{Expr, ExprKind};
use crate::hcl::module::Module;
use crate::hcl::value::{Shape, Value};
use hcl_edit::expr::{Expression, ObjectKey, Traversal, TraversalOperator};
use hcl_edit::template::Element;
use std::collections::BTreeMap;

/// Upper bound on expression nesting, including `local.*` indirections
const MAX_DEPTH: usize = 64;

/// Evaluates expressions in the context of one module
pub struct Evaluator<'a> {
    module: &'a Module,
    inputs: &'a BTreeMap<String, Value>,
}

impl<'a> Evaluator<'a> {
    /// `inputs` holds the known values of the module's input variables
    pub fn new(module: &'a Module, inputs: &'a BTreeMap<String, Value>) -> Self {
        Self { module, inputs }
    }

    /// Evaluate `expr` and convert the result to `shape`
    pub fn evaluate(&self, expr: &Expr, shape: Shape) -> Result<Value, EvalError> {
        self.eval(expr, 0)?.conform(shape)
    }

    fn eval(&self, expr: &Expr, depth: usize) -> Result<Value, EvalError> {
        match expr.kind() {
            ExprKind::Hcl(expression) => self.eval_hcl(expression, depth),
            ExprKind::Json(json) => Value::from_json(json),
        }
    }

    fn eval_hcl(&self, expr: &Expression, depth: usize) -> Result<Value, EvalError> {
        if depth > MAX_DEPTH {
            return Err(EvalError::Unsupported(
                "expression nesting too deep".to_string(),
            ));
        }
        let depth = depth + 1;

        match expr {
            Expression::Null(_) => Ok(Value::Null),
            Expression::Bool(b) => Ok(Value::Bool(*b.value())),
            Expression::Number(n) => n
                .value()
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| EvalError::Unsupported("number out of range".to_string())),
            Expression::String(s) => Ok(Value::String(s.value().to_string())),
            Expression::Array(array) => array
                .iter()
                .map(|item| self.eval_hcl(item, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expression::Object(object) => {
                let mut map = BTreeMap::new();
                for (key, value) in object.iter() {
                    let key = match key {
                        ObjectKey::Ident(ident) => ident.as_str().to_string(),
                        ObjectKey::Expression(key_expr) => {
                            self.eval_hcl(key_expr, depth)?.into_string()?
                        }
                    };
                    map.insert(key, self.eval_hcl(value.expr(), depth)?);
                }
                Ok(Value::Map(map))
            }
            Expression::StringTemplate(template) => self.eval_template(template.iter(), depth),
            Expression::HeredocTemplate(heredoc) => {
                self.eval_template(heredoc.template.iter(), depth)
            }
            Expression::Parenthesis(inner) => self.eval_hcl(inner.inner(), depth),
            Expression::Conditional(cond) => match self.eval_hcl(&cond.cond_expr, depth)? {
                Value::Bool(true) => self.eval_hcl(&cond.true_expr, depth),
                Value::Bool(false) => self.eval_hcl(&cond.false_expr, depth),
                other => Err(EvalError::TypeMismatch {
                    expected: "bool",
                    found: other.type_name(),
                }),
            },
            Expression::Traversal(traversal) => self.eval_traversal(traversal, depth),
            Expression::Variable(ident) => Err(EvalError::Unknown(format!(
                "reference to {}",
                ident.as_str()
            ))),
            _ => Err(EvalError::Unsupported(
                "function calls, operators and for expressions are not evaluated".to_string(),
            )),
        }
    }

    fn eval_template<'e>(
        &self,
        elements: impl Iterator<Item = &'e Element>,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let mut out = String::new();
        for element in elements {
            match element {
                Element::Literal(literal) => out.push_str(literal.value()),
                Element::Interpolation(interpolation) => {
                    out.push_str(&self.eval_hcl(&interpolation.expr, depth)?.into_string()?);
                }
                Element::Directive(_) => {
                    return Err(EvalError::Unsupported("template directive".to_string()));
                }
            }
        }
        Ok(Value::String(out))
    }

    fn eval_traversal(&self, traversal: &Traversal, depth: usize) -> Result<Value, EvalError> {
        let Some(root) = traversal.expr.as_variable() else {
            return Err(EvalError::Unsupported(
                "traversal of a non-reference expression".to_string(),
            ));
        };

        let mut operators = traversal.operators.iter().map(|op| op.value());
        let name = match operators.next() {
            Some(TraversalOperator::GetAttr(name)) => name.as_str().to_string(),
            _ => {
                return Err(EvalError::Unknown(format!(
                    "reference to {}",
                    root.as_str()
                )));
            }
        };

        let mut value = match root.as_str() {
            "var" => self.variable_value(&name, depth)?,
            "local" => self.local_value(&name, depth)?,
            other => {
                return Err(EvalError::Unknown(format!("reference to {}.{}", other, name)));
            }
        };

        for operator in operators {
            value = match operator {
                TraversalOperator::GetAttr(attr) => index_map(value, attr.as_str())?,
                TraversalOperator::Index(index) => match self.eval_hcl(index, depth)? {
                    Value::Number(n) => index_list(value, list_index(n)?)?,
                    Value::String(key) => index_map(value, &key)?,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "number or string",
                            found: other.type_name(),
                        });
                    }
                },
                TraversalOperator::LegacyIndex(index) => index_list(value, *index.value() as usize)?,
                _ => return Err(EvalError::Unsupported("splat expression".to_string())),
            };
        }

        Ok(value)
    }

    /// Known input value, else the variable's default
    fn variable_value(&self, name: &str, depth: usize) -> Result<Value, EvalError> {
        if let Some(value) = self.inputs.get(name) {
            return Ok(value.clone());
        }
        match self.module.variable(name) {
            Some(variable) => match &variable.default {
                Some(default) => self.eval(default, depth),
                None => Err(EvalError::Unknown(format!("var.{} has no value", name))),
            },
            None => Err(EvalError::Unknown(format!("var.{} is not declared", name))),
        }
    }

    fn local_value(&self, name: &str, depth: usize) -> Result<Value, EvalError> {
        match self.module.local(name) {
            Some(local) => self.eval(&local.expr, depth),
            None => Err(EvalError::Unknown(format!("local.{} is not declared", name))),
        }
    }
}

fn index_map(value: Value, key: &str) -> Result<Value, EvalError> {
    match value {
        Value::Map(mut map) => map
            .remove(key)
            .ok_or_else(|| EvalError::Unknown(format!("no attribute {}", key))),
        other => Err(EvalError::TypeMismatch {
            expected: "map",
            found: other.type_name(),
        }),
    }
}

/// A number usable as a list index
fn list_index(n: f64) -> Result<usize, EvalError> {
    if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
        return Err(EvalError::TypeMismatch {
            expected: "non-negative whole number",
            found: "number",
        });
    }
    Ok(n as usize)
}

fn index_list(value: Value, index: usize) -> Result<Value, EvalError> {
    match value {
        Value::List(mut items) if index < items.len() => Ok(items.swap_remove(index)),
        Value::List(_) => Err(EvalError::Unknown(format!("index {} out of range", index))),
        other => Err(EvalError::TypeMismatch {
            expected: "list",
            found: other.type_name(),
        }),
    }
}
