#![forbid(unsafe_code)]

//! Core Rule trait

use crate::error::RuleError;
use crate::runner::Runner;
use crate::types::Severity;

/// Trait that all rules must implement
///
/// Rules are stateless: everything they read comes through the runner and
/// everything they report goes back through it. The trait is `Send + Sync`
/// so one rule set can serve modules checked in parallel.
pub trait Rule: Send + Sync {
    /// Returns the unique name of this rule
    ///
    /// The name is the key of the rule's `[rules]` entry and the identifier
    /// used in ignore annotations.
    fn name(&self) -> &str;

    /// Returns whether the rule runs when configuration says nothing about it
    fn enabled(&self) -> bool;

    /// Returns the default severity of issues from this rule
    fn severity(&self) -> Severity;

    /// Returns the documentation link, or an empty string
    fn link(&self) -> &str;

    /// Inspects the module behind `runner` and emits issues through it
    ///
    /// Returns an error only when the rule cannot query configuration at all.
    /// Values that cannot be evaluated are skipped, not reported.
    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError>;
}

/// Documentation link for a rule shipped with this crate
pub fn reference_link(rule_name: &str) -> String {
    format!(
        "{}/blob/v{}/docs/rules/{}.md",
        env!("CARGO_PKG_REPOSITORY"),
        env!("CARGO_PKG_VERSION"),
        rule_name
    )
}
