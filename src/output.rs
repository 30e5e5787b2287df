//! Output formatters (human, JSONL and JSON)

pub mod human;
pub mod json;
pub mod jsonl;
pub mod rule_status;

pub use human::HumanFormatter;
pub use json::JsonFormatter;
pub use jsonl::JsonlFormatter;
pub use rule_status::{RuleStatus, RuleStatusHumanFormatter, RuleStatusJsonlFormatter};
