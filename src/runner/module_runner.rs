#![forbid(unsafe_code)]

//! In-process [`Runner`] backed by a loaded [`Module`]

use crate::config::Config;
use crate::error::{EvalError, RuleError};
use crate::hcl::{Annotation, Declaration, Evaluator, Expr, Module, ModuleCall, Shape, Value};
use crate::rules::Rule;
use crate::runner::{BodySchema, ResourceBlock, Runner};
use crate::types::{Issue, SourceRange};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Runs rules against one module and collects their issues
///
/// Each runner owns its issue sink, so separate runners can be used from
/// separate threads against the same (immutable) configuration.
#[derive(Debug)]
pub struct ModuleRunner<'a> {
    module: &'a Module,
    config: &'a Config,
    inputs: BTreeMap<String, Value>,
    annotations: Vec<Annotation>,
    issues: Vec<Issue>,
}

impl<'a> ModuleRunner<'a> {
    /// Create a runner for `module`
    ///
    /// For the root module, input variables are taken from its tfvars files.
    pub fn new(module: &'a Module, config: &'a Config) -> Self {
        let annotations = module
            .files()
            .iter()
            .flat_map(|file| file.annotations.iter().cloned())
            .collect();

        let mut runner = Self {
            module,
            config,
            inputs: BTreeMap::new(),
            annotations,
            issues: Vec::new(),
        };

        if module.is_root() {
            let empty = BTreeMap::new();
            let evaluator = Evaluator::new(module, &empty);
            runner.inputs = known_values(
                module
                    .input_values()
                    .iter()
                    .map(|(name, expr)| (name, evaluator.evaluate(expr, Shape::Any))),
            );
        }

        runner
    }

    /// Replace the known input variable values
    pub fn with_inputs(mut self, inputs: BTreeMap<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// Issues emitted so far, in emission order
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Drain the collected issues
    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Statically known argument values of a module call made by this module
    ///
    /// Arguments that cannot be evaluated are left out, so the child module
    /// falls back to its variable defaults for them.
    pub fn module_call_inputs(&self, call: &ModuleCall) -> BTreeMap<String, Value> {
        let evaluator = Evaluator::new(self.module, &self.inputs);
        known_values(
            call.arguments
                .iter()
                .map(|arg| (&arg.name, evaluator.evaluate(&arg.expr, Shape::Any))),
        )
    }

    fn is_suppressed(&self, rule_name: &str, range: &SourceRange) -> bool {
        self.annotations
            .iter()
            .any(|annotation| annotation.matches(rule_name, range))
    }
}

fn known_values<'n>(
    results: impl Iterator<Item = (&'n String, Result<Value, EvalError>)>,
) -> BTreeMap<String, Value> {
    results
        .filter_map(|(name, result)| match result {
            Ok(value) => Some((name.clone(), value)),
            Err(err) => {
                tracing::debug!(variable = %name, error = %err, "input value is not known");
                None
            }
        })
        .collect()
}

impl Runner for ModuleRunner<'_> {
    fn get_resource_content(
        &self,
        resource_type: &str,
        schema: &BodySchema,
    ) -> Result<Vec<ResourceBlock>, RuleError> {
        validate_schema(resource_type, schema)?;

        let mut blocks = Vec::new();
        for resource in self
            .module
            .resources()
            .iter()
            .filter(|resource| resource.resource_type == resource_type)
        {
            let mut attributes = BTreeMap::new();
            for requested in &schema.attributes {
                if let Some(attribute) = resource.attribute(&requested.name) {
                    attributes.insert(requested.name.clone(), attribute.clone());
                } else if resource.nested_blocks.contains(&requested.name) {
                    return Err(RuleError::SchemaMismatch {
                        resource: format!("{}.{}", resource.resource_type, resource.name),
                        message: format!(
                            "\"{}\" is declared as a block, expected an attribute",
                            requested.name
                        ),
                    });
                }
            }

            blocks.push(ResourceBlock {
                resource_type: resource.resource_type.clone(),
                name: resource.name.clone(),
                def_range: resource.def_range.clone(),
                range: resource.range.clone(),
                attributes,
            });
        }

        Ok(blocks)
    }

    fn evaluate_expr(&self, expr: &Expr, shape: Shape) -> Result<Value, EvalError> {
        Evaluator::new(self.module, &self.inputs).evaluate(expr, shape)
    }

    fn emit_issue(&mut self, rule: &dyn Rule, message: String, range: SourceRange) {
        if self.is_suppressed(rule.name(), &range) {
            tracing::debug!(rule = rule.name(), range = %range, "issue suppressed by annotation");
            return;
        }

        let severity = self
            .config
            .severity_override(rule.name())
            .unwrap_or_else(|| rule.severity());

        self.issues.push(Issue {
            rule: rule.name().to_string(),
            severity,
            link: rule.link().to_string(),
            message,
            range,
        });
    }

    fn is_root_module(&self) -> bool {
        self.module.is_root()
    }

    fn module_dir(&self) -> &Path {
        self.module.dir()
    }

    fn module_files(&self) -> Vec<String> {
        self.module
            .files()
            .iter()
            .map(|file| file.name.clone())
            .collect()
    }

    fn outputs(&self) -> Vec<Declaration> {
        self.module.outputs().to_vec()
    }

    fn locals(&self) -> Vec<Declaration> {
        self.module
            .locals()
            .iter()
            .map(|local| Declaration {
                name: local.name.clone(),
                decl_range: local.decl_range.clone(),
            })
            .collect()
    }

    fn rule_options(&self, rule_name: &str) -> Option<toml::Table> {
        self.config.rule_options(rule_name).cloned()
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_schema(resource_type: &str, schema: &BodySchema) -> Result<(), RuleError> {
    if !is_identifier(resource_type) {
        return Err(RuleError::InvalidSchema(format!(
            "invalid resource type \"{}\"",
            resource_type
        )));
    }

    let mut seen = HashSet::new();
    for attribute in &schema.attributes {
        if !is_identifier(&attribute.name) {
            return Err(RuleError::InvalidSchema(format!(
                "invalid attribute name \"{}\"",
                attribute.name
            )));
        }
        if !seen.insert(attribute.name.as_str()) {
            return Err(RuleError::InvalidSchema(format!(
                "duplicate attribute \"{}\"",
                attribute.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::AttributeSchema;
    use crate::types::Severity;

    struct TestRule;

    impl Rule for TestRule {
        fn name(&self) -> &str {
            "test_rule"
        }

        fn enabled(&self) -> bool {
            true
        }

        fn severity(&self) -> Severity {
            Severity::Warning
        }

        fn link(&self) -> &str {
            "https://example.com/test_rule"
        }

        fn check(&self, _runner: &mut dyn Runner) -> Result<(), RuleError> {
            Ok(())
        }
    }

    const CONFIG: &str = r#"
resource "azurerm_storage_account" "a" {
  account_tier = "Standard"
  network_rules {
    default_action = "Deny"
  }
}

resource "azurerm_storage_account" "b" {
  name = "b"
}

resource "azurerm_key_vault" "kv" {
  name = "kv"
}
"#;

    #[test]
    fn test_get_resource_content_filters_type_and_attributes() {
        let module = Module::from_sources(".", &[("main.tf", CONFIG)]).unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        let blocks = runner
            .get_resource_content(
                "azurerm_storage_account",
                &BodySchema::with_attributes(&["account_tier"]),
            )
            .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "a");
        assert!(blocks[0].attributes.contains_key("account_tier"));
        assert_eq!(blocks[1].name, "b");
        assert!(blocks[1].attributes.is_empty());
    }

    #[test]
    fn test_get_resource_content_rejects_malformed_schema() {
        let module = Module::from_sources(".", &[("main.tf", CONFIG)]).unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        let empty_name = BodySchema {
            attributes: vec![AttributeSchema {
                name: String::new(),
            }],
        };
        assert!(matches!(
            runner.get_resource_content("azurerm_storage_account", &empty_name),
            Err(RuleError::InvalidSchema(_))
        ));

        let duplicate = BodySchema::with_attributes(&["tags", "tags"]);
        assert!(matches!(
            runner.get_resource_content("azurerm_storage_account", &duplicate),
            Err(RuleError::InvalidSchema(_))
        ));

        assert!(matches!(
            runner.get_resource_content("bad type", &BodySchema::default()),
            Err(RuleError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_get_resource_content_block_where_attribute_expected() {
        let module = Module::from_sources(".", &[("main.tf", CONFIG)]).unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        let result = runner.get_resource_content(
            "azurerm_storage_account",
            &BodySchema::with_attributes(&["network_rules"]),
        );
        assert!(matches!(result, Err(RuleError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_emit_issue_uses_rule_metadata() {
        let module = Module::from_sources(".", &[("main.tf", CONFIG)]).unwrap();
        let config = Config::default();
        let mut runner = ModuleRunner::new(&module, &config);

        runner.emit_issue(
            &TestRule,
            "something is wrong".to_string(),
            SourceRange::file_start("main.tf"),
        );

        assert_eq!(runner.issues().len(), 1);
        let issue = &runner.issues()[0];
        assert_eq!(issue.rule, "test_rule");
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.link, "https://example.com/test_rule");
        assert_eq!(issue.message, "something is wrong");
    }

    #[test]
    fn test_emit_issue_applies_severity_override() {
        let module = Module::from_sources(".", &[("main.tf", CONFIG)]).unwrap();
        let config = Config::parse(
            r#"
[rules.test_rule]
severity = "error"
"#,
        )
        .unwrap();
        let mut runner = ModuleRunner::new(&module, &config);

        runner.emit_issue(&TestRule, "x".to_string(), SourceRange::file_start("main.tf"));
        assert_eq!(runner.issues()[0].severity, Severity::Error);
    }

    #[test]
    fn test_emit_issue_respects_annotations() {
        let source = "# tfpolicy-ignore: test_rule\nresource \"a\" \"b\" {}\n";
        let module = Module::from_sources(".", &[("main.tf", source)]).unwrap();
        let config = Config::default();
        let mut runner = ModuleRunner::new(&module, &config);

        let suppressed = module.resources()[0].def_range.clone();
        runner.emit_issue(&TestRule, "hidden".to_string(), suppressed);
        runner.emit_issue(
            &TestRule,
            "shown".to_string(),
            SourceRange::file_start("other.tf"),
        );

        let messages: Vec<&str> = runner.issues().iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["shown"]);
    }

    #[test]
    fn test_root_inputs_from_tfvars() {
        let module = Module::from_sources(
            ".",
            &[
                ("main.tf", "variable \"tier\" {\n  default = \"Standard\"\n}\nresource \"t\" \"r\" {\n  tier = var.tier\n}\n"),
                ("terraform.tfvars", "tier = \"Premium\"\n"),
            ],
        )
        .unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        let attribute = module.resources()[0].attribute("tier").unwrap();
        assert_eq!(
            runner.evaluate_expr(&attribute.expr, Shape::String).unwrap(),
            Value::String("Premium".to_string())
        );
    }

    #[test]
    fn test_module_call_inputs_skip_unknown() {
        let module = Module::from_sources(
            ".",
            &[(
                "main.tf",
                "module \"child\" {\n  source = \"./child\"\n  tier = \"Premium\"\n  id = azurerm_resource_group.main.id\n}\n",
            )],
        )
        .unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        let inputs = runner.module_call_inputs(&module.module_calls()[0]);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs["tier"], Value::String("Premium".to_string()));
    }

    #[test]
    fn test_introspection() {
        let module = Module::from_sources(
            "stack",
            &[
                ("main.tf", "output \"o\" {\n  value = 1\n}\nlocals {\n  a = 1\n}\n"),
                ("locals.tf", ""),
            ],
        )
        .unwrap();
        let config = Config::default();
        let runner = ModuleRunner::new(&module, &config);

        assert!(runner.is_root_module());
        assert_eq!(runner.module_dir(), Path::new("stack"));
        assert_eq!(runner.module_files(), vec!["stack/locals.tf", "stack/main.tf"]);
        assert_eq!(runner.outputs()[0].name, "o");
        assert_eq!(runner.locals()[0].name, "a");
        assert_eq!(runner.locals()[0].decl_range.filename, "stack/main.tf");
    }
}
