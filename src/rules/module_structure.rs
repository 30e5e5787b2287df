#![forbid(unsafe_code)]

//! `terraform_customised_module_structure`
//!
//! Extends the standard module layout with two conventions: outputs live in
//! `data.tf` and local values live in `locals.tf`. Both files must exist in the
//! root module, even when empty, unless the module is written purely in JSON.

use crate::error::RuleError;
use crate::hcl::{Declaration, display_path, has_json_extension};
use crate::rules::{Rule, reference_link};
use crate::runner::Runner;
use crate::types::{Severity, SourceRange};
use std::collections::BTreeSet;
use std::path::Path;

const FILENAME_DATA: &str = "data.tf";
const FILENAME_LOCALS: &str = "locals.tf";

const RULE_NAME: &str = "terraform_customised_module_structure";

/// Checks that outputs and locals are declared in their conventional files
#[derive(Debug)]
pub struct ModuleStructureRule {
    link: String,
}

impl ModuleStructureRule {
    pub fn new() -> Self {
        Self {
            link: reference_link(RULE_NAME),
        }
    }

    fn check_files(&self, runner: &mut dyn Runner) {
        let files = runner.module_files();
        if only_json(&files) {
            return;
        }

        let base_names: BTreeSet<&str> = files.iter().map(|name| base_name(name)).collect();
        tracing::debug!(count = base_names.len(), files = ?base_names, "files found");

        let expectations = [
            (FILENAME_DATA, runner.outputs().is_empty()),
            (FILENAME_LOCALS, runner.locals().is_empty()),
        ];
        for (expected, nothing_declared) in expectations {
            if !base_names.contains(expected) && nothing_declared {
                let filename = display_path(runner.module_dir(), expected);
                runner.emit_issue(
                    self,
                    format!("Module should include an empty {} file", expected),
                    SourceRange::file_start(filename),
                );
            }
        }
    }

    fn check_placement(
        &self,
        runner: &mut dyn Runner,
        declarations: Vec<Declaration>,
        kind: &str,
        expected: &str,
    ) {
        for declaration in declarations {
            let filename = &declaration.decl_range.filename;
            if should_move(filename, expected) {
                runner.emit_issue(
                    self,
                    format!(
                        "{} {:?} should be moved from {} to {}",
                        kind, declaration.name, filename, expected
                    ),
                    declaration.decl_range.clone(),
                );
            }
        }
    }
}

impl Default for ModuleStructureRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ModuleStructureRule {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn enabled(&self) -> bool {
        false
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError> {
        if !runner.is_root_module() {
            return Ok(());
        }

        tracing::trace!(
            rule = self.name(),
            module = %runner.module_dir().display(),
            "checking rule"
        );

        self.check_files(runner);

        let outputs = runner.outputs();
        self.check_placement(runner, outputs, "data", FILENAME_DATA);

        let locals = runner.locals();
        self.check_placement(runner, locals, "local", FILENAME_LOCALS);

        Ok(())
    }
}

fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// True when there is at least one file and every file is JSON
fn only_json(files: &[String]) -> bool {
    !files.is_empty() && files.iter().all(|name| has_json_extension(name))
}

/// JSON files are usually generated, so naming conventions do not apply
fn should_move(path: &str, expected: &str) -> bool {
    !has_json_extension(path) && base_name(path) != expected
}
