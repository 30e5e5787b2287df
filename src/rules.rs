#![forbid(unsafe_code)]

//! Rule definitions and the rule set

mod invalid_account_tier;
mod missing_tags;
mod module_structure;
pub mod policy_values;
mod registry;
mod rule;

pub use invalid_account_tier::InvalidAccountTierRule;
pub use missing_tags::{MissingTagsOptions, MissingTagsRule};
pub use module_structure::ModuleStructureRule;
pub use registry::{RULE_SET_NAME, RuleOverrides, RuleSet};
pub use rule::{Rule, reference_link};
