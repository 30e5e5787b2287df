#![forbid(unsafe_code)]

//! `azurerm_resource_missing_tags`: resources must carry every required tag

use crate::error::RuleError;
use crate::hcl::{Shape, Value};
use crate::rules::Rule;
use crate::rules::policy_values::DEFAULT_TAGGED_RESOURCE_TYPES;
use crate::runner::{BodySchema, Runner, decode_rule_options, ensure_no_error};
use crate::types::{Severity, SourceRange};
use serde::Deserialize;
use std::collections::BTreeSet;

const TAGS_ATTRIBUTE: &str = "tags";

/// Options read from the rule's `[rules.azurerm_resource_missing_tags]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissingTagsOptions {
    /// Tag keys every checked resource must define
    pub tags: Vec<String>,

    /// Resource types to check; defaults to [`DEFAULT_TAGGED_RESOURCE_TYPES`]
    pub resource_types: Option<Vec<String>>,
}

impl MissingTagsOptions {
    fn resource_types(&self) -> Vec<String> {
        match &self.resource_types {
            Some(types) => types.clone(),
            None => DEFAULT_TAGGED_RESOURCE_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Reports resources whose `tags` lack one or more required keys
///
/// Keys are compared exactly, so `foo` does not satisfy a required `Foo`.
#[derive(Debug, Default)]
pub struct MissingTagsRule;

impl MissingTagsRule {
    pub fn new() -> Self {
        Self
    }

    fn emit_missing<'k>(
        &self,
        runner: &mut dyn Runner,
        required: &[String],
        present: impl Iterator<Item = &'k String>,
        range: SourceRange,
    ) {
        let present: BTreeSet<&String> = present.collect();
        let missing: BTreeSet<&String> = required
            .iter()
            .filter(|tag| !present.contains(tag))
            .collect();
        if missing.is_empty() {
            return;
        }

        let listed = missing
            .iter()
            .map(|tag| format!("{:?}", tag))
            .collect::<Vec<_>>()
            .join(", ");
        runner.emit_issue(
            self,
            format!("The resource is missing the following tags: {}.", listed),
            range,
        );
    }
}

impl Rule for MissingTagsRule {
    fn name(&self) -> &str {
        "azurerm_resource_missing_tags"
    }

    fn enabled(&self) -> bool {
        false
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn link(&self) -> &str {
        ""
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError> {
        let options: MissingTagsOptions = decode_rule_options(runner, self.name())?;
        if options.tags.is_empty() {
            return Ok(());
        }

        let schema = BodySchema::with_attributes(&[TAGS_ATTRIBUTE]);
        for resource_type in options.resource_types() {
            for resource in runner.get_resource_content(&resource_type, &schema)? {
                let Some(tags) = resource.attributes.get(TAGS_ATTRIBUTE) else {
                    self.emit_missing(
                        runner,
                        &options.tags,
                        std::iter::empty(),
                        resource.def_range.clone(),
                    );
                    continue;
                };

                let evaluated = runner
                    .evaluate_expr(&tags.expr, Shape::Map)
                    .and_then(Value::into_map);
                ensure_no_error(evaluated, |values| {
                    self.emit_missing(
                        runner,
                        &options.tags,
                        values.keys(),
                        tags.expr.range().clone(),
                    );
                    Ok(())
                })?;
            }
        }

        Ok(())
    }
}
