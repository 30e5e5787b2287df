#![forbid(unsafe_code)]

//! `azurerm_storage_account_invalid_account_tier`

use crate::error::RuleError;
use crate::hcl::{Shape, Value};
use crate::rules::Rule;
use crate::rules::policy_values::VALID_ACCOUNT_TIERS;
use crate::runner::{BodySchema, Runner, ensure_no_error};
use crate::types::Severity;

const RESOURCE_TYPE: &str = "azurerm_storage_account";
const ATTRIBUTE_NAME: &str = "account_tier";

/// Checks `account_tier` of storage accounts against the accepted tiers
#[derive(Debug, Default)]
pub struct InvalidAccountTierRule;

impl InvalidAccountTierRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for InvalidAccountTierRule {
    fn name(&self) -> &str {
        "azurerm_storage_account_invalid_account_tier"
    }

    fn enabled(&self) -> bool {
        false
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn link(&self) -> &str {
        ""
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError> {
        let resources = runner.get_resource_content(
            RESOURCE_TYPE,
            &BodySchema::with_attributes(&[ATTRIBUTE_NAME]),
        )?;

        for resource in resources {
            let Some(attribute) = resource.attributes.get(ATTRIBUTE_NAME) else {
                continue;
            };

            let evaluated = runner
                .evaluate_expr(&attribute.expr, Shape::String)
                .and_then(Value::into_string);
            ensure_no_error(evaluated, |tier| {
                if !VALID_ACCOUNT_TIERS.contains(&tier.as_str()) {
                    runner.emit_issue(
                        self,
                        format!("\"{}\" is an invalid value as Account Tier", tier),
                        attribute.expr.range().clone(),
                    );
                }
                Ok(())
            })?;
        }

        Ok(())
    }
}
