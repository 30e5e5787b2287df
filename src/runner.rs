#![forbid(unsafe_code)]

//! The capability interface rules use to read configuration and report issues
//!
//! Rules never build their own configuration tree. They receive a
//! `&mut dyn Runner` and go through it for every query, evaluation and
//! emission, which keeps them free of I/O and trivially testable.

mod module_runner;

pub use module_runner::ModuleRunner;

use crate::error::{ConfigError, EvalError, RuleError};
use crate::hcl::{Attribute, Declaration, Expr, Shape, Value};
use crate::rules::Rule;
use crate::types::SourceRange;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// One attribute requested from a resource body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: String,
}

/// The attributes a rule wants to see
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodySchema {
    pub attributes: Vec<AttributeSchema>,
}

impl BodySchema {
    /// Schema requesting the given attribute names
    pub fn with_attributes(names: &[&str]) -> Self {
        Self {
            attributes: names
                .iter()
                .map(|name| AttributeSchema {
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

/// A resource block narrowed to the attributes of a [`BodySchema`]
#[derive(Debug, Clone)]
pub struct ResourceBlock {
    pub resource_type: String,
    pub name: String,
    /// Range of the block header, `resource "type" "name"`
    pub def_range: SourceRange,
    /// Range of the whole block
    pub range: SourceRange,
    /// Requested attributes that are present in the block
    pub attributes: BTreeMap<String, Attribute>,
}

/// Host capability handed to every rule check
pub trait Runner {
    /// Resources of `resource_type` with only the attributes in `schema`
    ///
    /// Fails when the schema is malformed or the configuration cannot be
    /// matched against it.
    fn get_resource_content(
        &self,
        resource_type: &str,
        schema: &BodySchema,
    ) -> Result<Vec<ResourceBlock>, RuleError>;

    /// Statically evaluate an expression into `shape`
    fn evaluate_expr(&self, expr: &Expr, shape: Shape) -> Result<Value, EvalError>;

    /// Record one issue for `rule`
    fn emit_issue(&mut self, rule: &dyn Rule, message: String, range: SourceRange);

    /// Whether the module under inspection is the root module
    fn is_root_module(&self) -> bool;

    /// Directory of the module under inspection
    fn module_dir(&self) -> &Path;

    /// Configuration file paths of the module, in name order
    fn module_files(&self) -> Vec<String>;

    /// Declared `output` blocks
    fn outputs(&self) -> Vec<Declaration>;

    /// Declared local values
    fn locals(&self) -> Vec<Declaration>;

    /// Free-form options from the rule's configuration entry
    fn rule_options(&self, rule_name: &str) -> Option<toml::Table>;
}

/// Run `proceed` with an evaluated value, skipping evaluation failures
///
/// Evaluation failures are scoped to one item: they are logged and turned
/// into `Ok(())` so sibling resources are still checked. Errors returned by
/// `proceed` itself propagate.
pub fn ensure_no_error<T>(
    result: Result<T, EvalError>,
    proceed: impl FnOnce(T) -> Result<(), RuleError>,
) -> Result<(), RuleError> {
    match result {
        Ok(value) => proceed(value),
        Err(err) => {
            tracing::debug!(error = %err, "skipping item whose value cannot be evaluated");
            Ok(())
        }
    }
}

/// Decode a rule's options table into `T`
///
/// A missing entry decodes to `T::default()`.
pub fn decode_rule_options<T>(runner: &dyn Runner, rule_name: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let Some(options) = runner.rule_options(rule_name) else {
        return Ok(T::default());
    };

    toml::Value::Table(options)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::InvalidOptions {
            rule: rule_name.to_string(),
            message: e.message().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_schema_with_attributes() {
        let schema = BodySchema::with_attributes(&["tags", "name"]);
        assert_eq!(schema.attributes.len(), 2);
        assert_eq!(schema.attributes[0].name, "tags");
        assert_eq!(schema.attributes[1].name, "name");
    }

    #[test]
    fn test_ensure_no_error_runs_on_success() {
        let mut seen = None;
        let result = ensure_no_error(Ok::<_, EvalError>("Standard"), |value| {
            seen = Some(value);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(seen, Some("Standard"));
    }

    #[test]
    fn test_ensure_no_error_skips_eval_failure() {
        let mut called = false;
        let result = ensure_no_error(
            Err::<String, _>(EvalError::Unknown("var.x".to_string())),
            |_| {
                called = true;
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert!(!called);
    }

    #[test]
    fn test_ensure_no_error_propagates_rule_error() {
        let result = ensure_no_error(Ok::<_, EvalError>(()), |_| {
            Err(RuleError::InvalidSchema("boom".to_string()))
        });
        assert!(matches!(result, Err(RuleError::InvalidSchema(_))));
    }
}
