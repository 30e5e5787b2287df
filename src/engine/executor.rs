#![forbid(unsafe_code)]

//! Parallel execution engine for running rules across modules
//!
//! This module provides the ExecutionEngine which loads each module, follows
//! local module calls, and runs every enabled rule against it. Independent
//! module directories are checked in parallel using rayon.

use crate::config::{CallModuleType, Config};
use crate::error::{ConfigError, LoadError};
use crate::hcl::{Module, ModuleCall, Value, display_path};
use crate::rules::{Rule, RuleOverrides, RuleSet};
use crate::runner::ModuleRunner;
use crate::types::{Issue, Severity};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Maximum depth of nested local module calls
const MAX_MODULE_DEPTH: usize = 16;

/// What went wrong while checking a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunErrorKind {
    /// A configuration file has invalid syntax
    Parse,
    /// A module could not be read or resolved
    Load,
    /// A rule failed to query configuration
    Rule,
}

/// An error recorded during a run
///
/// Errors do not stop the run: other rules and other modules are still
/// checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    pub kind: RunErrorKind,
    /// Module directory, as displayed in diagnostics
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub message: String,
}

impl RunError {
    fn load(module: &Path, err: &LoadError) -> Self {
        let kind = match err {
            LoadError::Parse { .. } => RunErrorKind::Parse,
            _ => RunErrorKind::Load,
        };
        Self {
            kind,
            module: module_label(module),
            rule: None,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "{} ({}): {}", self.module, rule, self.message),
            None => write!(f, "{}: {}", self.module, self.message),
        }
    }
}

/// Result of executing all rules against all modules
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// All issues found, grouped by module then rule, in emission order
    pub issues: Vec<Issue>,
    /// Errors recorded while loading modules or running rules
    pub errors: Vec<RunError>,
    /// Number of modules checked, child modules included
    pub modules_checked: usize,
    /// Number of rules executed per module
    pub rules_executed: usize,
}

impl ExecutionResult {
    /// Whether any configuration file failed to parse
    pub fn has_parse_errors(&self) -> bool {
        self.errors.iter().any(|e| e.kind == RunErrorKind::Parse)
    }

    /// Issues at or above `minimum`
    pub fn failing_issues(&self, minimum: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.severity >= minimum)
    }

    fn merge(&mut self, other: ExecutionResult) {
        self.issues.extend(other.issues);
        self.errors.extend(other.errors);
        self.modules_checked += other.modules_checked;
    }

    /// Drop repeated reports of the same violation
    ///
    /// A module called twice, or from two roots, is checked once per call and
    /// may report identical issues each time.
    fn dedup_issues(&mut self) {
        let mut seen = HashSet::new();
        self.issues.retain(|issue| {
            seen.insert((
                issue.rule.clone(),
                issue.message.clone(),
                issue.range.clone(),
            ))
        });
    }
}

/// Execution engine that coordinates rule execution
///
/// The engine:
/// - Resolves the enabled rules once, up front
/// - Loads each requested module directory as a root module
/// - Follows local module calls when `call_module_type = "local"`
/// - Collects issues and errors from all rules
pub struct ExecutionEngine {
    rule_set: RuleSet,
    enabled: Vec<String>,
    config: Config,
}

impl ExecutionEngine {
    /// Creates an engine running the rules of `rule_set` enabled by `config`
    /// and `overrides`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownRule` if the configuration or overrides
    /// name a rule that is not in the rule set.
    pub fn new(
        rule_set: RuleSet,
        config: Config,
        overrides: &RuleOverrides,
    ) -> Result<Self, ConfigError> {
        let enabled = rule_set
            .enabled_rules(&config, overrides)?
            .into_iter()
            .map(|rule| rule.name().to_string())
            .collect();

        Ok(Self {
            rule_set,
            enabled,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rules that will run, in registration order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.enabled
            .iter()
            .filter_map(|name| self.rule_set.get_rule(name))
    }

    /// Check every directory in `module_dirs` as a root module
    ///
    /// A directory that another directory in the list calls as a local module
    /// is checked through that call only.
    pub fn execute(&self, module_dirs: &[PathBuf]) -> ExecutionResult {
        let as_root = self.root_modules(module_dirs);
        let results: Vec<ExecutionResult> = module_dirs
            .par_iter()
            .zip(as_root.par_iter())
            .filter(|(_, is_root)| **is_root)
            .map(|(dir, _)| match Module::load_dir(dir) {
                Ok(module) => self.check_module(&module),
                Err(err) => {
                    tracing::warn!(module = %dir.display(), error = %err, "failed to load module");
                    ExecutionResult {
                        errors: vec![RunError::load(dir, &err)],
                        ..ExecutionResult::default()
                    }
                }
            })
            .collect();

        let mut combined = ExecutionResult {
            rules_executed: self.enabled.len(),
            ..ExecutionResult::default()
        };
        for result in results {
            combined.merge(result);
        }
        combined.dedup_issues();
        combined
    }

    /// Which of `module_dirs` to check as root modules
    ///
    /// Directories reached through local module calls from another listed
    /// directory are skipped. Members of a call cycle with no caller outside
    /// the cycle are still checked, starting from the first listed.
    fn root_modules(&self, module_dirs: &[PathBuf]) -> Vec<bool> {
        if module_dirs.len() < 2 || self.config.config.call_module_type == CallModuleType::None {
            return vec![true; module_dirs.len()];
        }

        let index: HashMap<PathBuf, usize> = module_dirs
            .iter()
            .enumerate()
            .map(|(i, dir)| (normalize(dir), i))
            .collect();
        let edges: Vec<Vec<usize>> = module_dirs
            .par_iter()
            .enumerate()
            .map(|(i, dir)| {
                local_call_targets(dir)
                    .iter()
                    .filter_map(|target| index.get(target).copied())
                    .filter(|&j| j != i)
                    .collect()
            })
            .collect();

        let mut called = vec![false; module_dirs.len()];
        for &j in edges.iter().flatten() {
            called[j] = true;
        }

        let mut as_root: Vec<bool> = called.iter().map(|c| !c).collect();
        let mut reached = vec![false; module_dirs.len()];
        let visit = |start: usize, reached: &mut [bool]| {
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                if !std::mem::replace(&mut reached[i], true) {
                    stack.extend(edges[i].iter().copied());
                }
            }
        };
        for start in 0..module_dirs.len() {
            if as_root[start] {
                visit(start, &mut reached);
            }
        }
        // Whatever is left is only reachable through a cycle.
        for start in 0..module_dirs.len() {
            if !reached[start] {
                as_root[start] = true;
                visit(start, &mut reached);
            }
        }

        for (dir, is_root) in module_dirs.iter().zip(&as_root) {
            if !is_root {
                tracing::debug!(module = %dir.display(), "checked as a child module only");
            }
        }
        as_root
    }

    /// Check an already loaded root module and the local modules it calls
    pub fn check_module(&self, module: &Module) -> ExecutionResult {
        let mut result = ExecutionResult {
            rules_executed: self.enabled.len(),
            ..ExecutionResult::default()
        };
        let mut chain = vec![normalize(module.dir())];
        self.check_with_children(
            ModuleRunner::new(module, &self.config),
            &mut chain,
            &mut result,
        );
        result.dedup_issues();
        result
    }

    fn check_with_children(
        &self,
        mut runner: ModuleRunner<'_>,
        chain: &mut Vec<PathBuf>,
        result: &mut ExecutionResult,
    ) {
        let module = runner.module();
        tracing::debug!(
            module = %module.dir().display(),
            root = module.is_root(),
            "checking module"
        );

        for rule in self.enabled_rules() {
            if let Err(err) = rule.check(&mut runner) {
                tracing::warn!(
                    module = %module.dir().display(),
                    rule = rule.name(),
                    error = %err,
                    "rule check failed"
                );
                result.errors.push(RunError {
                    kind: RunErrorKind::Rule,
                    module: module_label(module.dir()),
                    rule: Some(rule.name().to_string()),
                    message: err.to_string(),
                });
            }
        }
        result.issues.extend(runner.take_issues());
        result.modules_checked += 1;

        if self.config.config.call_module_type == CallModuleType::None {
            return;
        }

        for call in module.module_calls().iter().filter(|call| call.is_local()) {
            let inputs = runner.module_call_inputs(call);
            self.check_child(module, call, inputs, chain, result);
        }
    }

    fn check_child(
        &self,
        parent: &Module,
        call: &ModuleCall,
        inputs: BTreeMap<String, Value>,
        chain: &mut Vec<PathBuf>,
        result: &mut ExecutionResult,
    ) {
        let Some(source) = call.source.as_deref() else {
            return;
        };
        let dir = normalize(&parent.dir().join(source));
        let file = call.decl_range.filename.clone();

        let invalid = |message: String| LoadError::InvalidModuleSource {
            file: file.clone(),
            source_path: source.to_string(),
            message,
        };

        if chain.contains(&dir) {
            result
                .errors
                .push(RunError::load(parent.dir(), &invalid("module calls itself".to_string())));
            return;
        }
        if chain.len() >= MAX_MODULE_DEPTH {
            result.errors.push(RunError::load(
                parent.dir(),
                &invalid(format!("module nesting deeper than {}", MAX_MODULE_DEPTH)),
            ));
            return;
        }
        if !dir.is_dir() {
            result.errors.push(RunError::load(
                parent.dir(),
                &invalid(format!("{} is not a directory", dir.display())),
            ));
            return;
        }

        let child = match Module::load_dir(&dir) {
            Ok(module) => module.into_child(),
            Err(err) => {
                result.errors.push(RunError::load(&dir, &err));
                return;
            }
        };

        chain.push(dir);
        let runner = ModuleRunner::new(&child, &self.config).with_inputs(inputs);
        self.check_with_children(runner, chain, result);
        chain.pop();
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("rule_set", &self.rule_set.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Module directory as displayed in diagnostics, `.` for the working directory
fn module_label(dir: &Path) -> String {
    let label = display_path(dir, "");
    match label.trim_end_matches('/') {
        "" => ".".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Normalized directories of the local modules `dir` calls
///
/// Load failures are left for the check itself to report.
fn local_call_targets(dir: &Path) -> Vec<PathBuf> {
    match Module::load_dir(dir) {
        Ok(module) => module
            .module_calls()
            .iter()
            .filter(|call| call.is_local())
            .filter_map(|call| call.source.as_deref())
            .map(|source| normalize(&dir.join(source)))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}
