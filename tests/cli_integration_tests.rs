//! CLI integration tests
//!
//! These tests run the `tfpolicy` binary against modules written to a
//! temporary directory and verify:
//! - check: exit codes, output formats, overrides, recursive mode
//! - list: rule set status in each format
//! - init: starter configuration creation
//!
//! Every command runs with the temporary directory as its working directory,
//! so no test changes the process-wide current directory.

mod common;

use assert_cmd::Command;
use common::{ALL_RULES_CONFIG, CLEAN_MODULE, DIRTY_MODULE, write_module};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn tfpolicy(dir: &TempDir) -> Command {
    let mut cmd = assert_ok!(Command::cargo_bin("tfpolicy"));
    cmd.current_dir(dir.path()).env_remove("TFPOLICY_LOG");
    cmd
}

fn project(files: &[(&str, &str)], config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    write_module(temp.path(), files);
    fs::write(temp.path().join(".tfpolicy.toml"), config).unwrap();
    temp
}

fn jsonl_records(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| assert_ok!(serde_json::from_str(line)))
        .collect()
}

// ============================================================================
// CHECK COMMAND TESTS
// ============================================================================

#[test]
fn test_check_clean_module_exits_zero() {
    let temp = project(CLEAN_MODULE, ALL_RULES_CONFIG);

    tfpolicy(&temp)
        .args(["check", "--color", "never"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_issues_exit_one() {
    let temp = project(DIRTY_MODULE, ALL_RULES_CONFIG);

    tfpolicy(&temp)
        .args(["check", "--color", "never"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 issue(s) found:"))
        .stdout(predicate::str::contains(
            "\"Gold\" is an invalid value as Account Tier (azurerm_storage_account_invalid_account_tier)",
        ))
        .stdout(predicate::str::contains("  on main.tf line 8, column 18"))
        .stdout(predicate::str::contains(
            "Module should include an empty locals.tf file",
        ));
}

#[test]
fn test_check_force_exits_zero_with_issues() {
    let temp = project(DIRTY_MODULE, ALL_RULES_CONFIG);

    tfpolicy(&temp)
        .args(["check", "--force", "--color", "never"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("3 issue(s) found:"));
}

#[test]
fn test_check_minimum_failure_severity() {
    let temp = project(
        DIRTY_MODULE,
        "[rules]\nterraform_customised_module_structure = true\n",
    );

    // The layout rule reports warnings only.
    tfpolicy(&temp)
        .args(["check", "--minimum-failure-severity", "error"])
        .assert()
        .code(0);

    tfpolicy(&temp)
        .args(["check", "--minimum-failure-severity", "warning"])
        .assert()
        .code(1);
}

#[test]
fn test_check_no_rules_enabled_warns() {
    let temp = project(DIRTY_MODULE, "");

    tfpolicy(&temp)
        .arg("check")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("No rules are enabled"));
}

#[test]
fn test_check_enable_rule_flag() {
    let temp = project(DIRTY_MODULE, "");

    tfpolicy(&temp)
        .args([
            "check",
            "--enable-rule",
            "azurerm_storage_account_invalid_account_tier",
            "--format",
            "jsonl",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid value as Account Tier"));
}

#[test]
fn test_check_disable_rule_flag() {
    let temp = project(DIRTY_MODULE, ALL_RULES_CONFIG);

    let output = tfpolicy(&temp)
        .args([
            "check",
            "--format",
            "jsonl",
            "--disable-rule",
            "azurerm_resource_missing_tags",
            "--disable-rule",
            "terraform_customised_module_structure",
        ])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let records = jsonl_records(&output);
    let issues: Vec<_> = records.iter().filter(|r| r["type"] == "issue").collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0]["rule"],
        "azurerm_storage_account_invalid_account_tier"
    );
}

#[test]
fn test_check_unknown_rule_flag_is_error() {
    let temp = project(CLEAN_MODULE, "");

    tfpolicy(&temp)
        .args(["check", "--enable-rule", "no_such_rule"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no_such_rule"));
}

#[test]
fn test_check_invalid_config_exits_three() {
    let temp = project(CLEAN_MODULE, "[rules\n");

    tfpolicy(&temp)
        .arg("check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid configuration syntax"));
}

#[test]
fn test_check_invalid_terraform_exits_three() {
    let temp = project(&[("main.tf", "resource \"a\" \"b\" {\n")], ALL_RULES_CONFIG);

    tfpolicy(&temp)
        .args(["check", "--color", "never"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to check"));
}

#[test]
fn test_check_explicit_config_file() {
    let temp = project(DIRTY_MODULE, "");
    fs::write(
        temp.path().join("ci.toml"),
        "[rules]\nazurerm_storage_account_invalid_account_tier = true\n",
    )
    .unwrap();

    tfpolicy(&temp)
        .args(["check", "--config", "ci.toml"])
        .assert()
        .code(1);

    tfpolicy(&temp)
        .args(["check", "--config", "missing.toml"])
        .assert()
        .code(2);
}

#[test]
fn test_check_jsonl_output() {
    let temp = project(DIRTY_MODULE, ALL_RULES_CONFIG);

    let output = tfpolicy(&temp)
        .args(["check", "--format", "jsonl"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let records = jsonl_records(&output);
    assert_eq!(records.len(), 4);

    let status = &records[3];
    assert_eq!(status["type"], "status");
    assert_eq!(status["passed"], false);
    assert_eq!(status["modules_checked"], 1);
    assert_eq!(status["rules_executed"], 3);
    assert_eq!(status["total_issues"], 3);
    assert_eq!(status["total_errors"], 0);

    // Sorted by file: locals.tf before main.tf
    assert_eq!(records[0]["file"], "locals.tf");
    assert_eq!(records[0]["severity"], "warning");
}

#[test]
fn test_check_json_output() {
    let temp = project(DIRTY_MODULE, ALL_RULES_CONFIG);

    let output = tfpolicy(&temp)
        .args(["check", "--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let document: serde_json::Value = assert_ok!(serde_json::from_slice(&output));
    let issues = assert_some!(document["issues"].as_array());
    assert_eq!(issues.len(), 3);
    assert_eq!(
        issues[1]["rule"]["name"],
        "azurerm_storage_account_invalid_account_tier"
    );
    assert_eq!(issues[1]["rule"]["severity"], "error");
    assert_eq!(issues[1]["range"]["filename"], "main.tf");
    assert_eq!(document["errors"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_check_recursive() {
    let temp = TempDir::new().unwrap();
    write_module(&temp.path().join("app"), CLEAN_MODULE);
    write_module(&temp.path().join("net"), DIRTY_MODULE);
    fs::write(temp.path().join(".tfpolicy.toml"), ALL_RULES_CONFIG).unwrap();

    let output = tfpolicy(&temp)
        .args(["check", "--recursive", "--format", "jsonl"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let records = jsonl_records(&output);
    let status = assert_some!(records.last());
    assert_eq!(status["modules_checked"], 2);
    assert_eq!(status["total_issues"], 3);
    assert!(
        records
            .iter()
            .filter(|r| r["type"] == "issue")
            .all(|r| r["file"].as_str().is_some_and(|f| f.starts_with("net/")))
    );
}

#[test]
fn test_check_without_recursive_ignores_subdirectories() {
    let temp = TempDir::new().unwrap();
    write_module(&temp.path().join("net"), DIRTY_MODULE);
    fs::write(temp.path().join(".tfpolicy.toml"), ALL_RULES_CONFIG).unwrap();

    // The working directory has no configuration files of its own; only the
    // layout rule has something to say about it.
    let output = tfpolicy(&temp)
        .args(["check", "--format", "jsonl"])
        .assert()
        .get_output()
        .stdout
        .clone();

    let records = jsonl_records(&output);
    let status = assert_some!(records.last());
    assert_eq!(status["modules_checked"], 1);
    assert!(
        records
            .iter()
            .filter(|r| r["type"] == "issue")
            .all(|r| r["file"].as_str().is_some_and(|f| !f.starts_with("net/")))
    );
}

// ============================================================================
// LIST COMMAND TESTS
// ============================================================================

#[test]
fn test_list_human() {
    let temp = project(&[], "[rules]\nterraform_customised_module_structure = true\n");

    tfpolicy(&temp)
        .arg("list")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("(1 of 3 rules enabled)"))
        .stdout(predicate::str::contains(
            "terraform_customised_module_structure (enabled)",
        ))
        .stdout(predicate::str::contains(
            "azurerm_resource_missing_tags (disabled)",
        ));
}

#[test]
fn test_list_jsonl() {
    let temp = project(&[], "");

    let output = tfpolicy(&temp)
        .args(["list", "--format", "jsonl"])
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();

    let records = jsonl_records(&output);
    let names: Vec<&str> = records.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "azurerm_resource_missing_tags",
            "azurerm_storage_account_invalid_account_tier",
            "terraform_customised_module_structure",
        ]
    );
    assert!(records.iter().all(|r| r["enabled"] == false));
}

#[test]
fn test_list_invalid_config_exits_three() {
    let temp = project(&[], "[config\n");

    tfpolicy(&temp).arg("list").assert().code(3);
}

// ============================================================================
// INIT COMMAND TESTS
// ============================================================================

#[test]
fn test_init_creates_config() {
    let temp = TempDir::new().unwrap();

    tfpolicy(&temp)
        .arg("init")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Created .tfpolicy.toml."));

    let content = fs::read_to_string(temp.path().join(".tfpolicy.toml")).unwrap();
    assert!(content.contains("[rules.azurerm_resource_missing_tags]"));

    // The generated file is accepted by check.
    tfpolicy(&temp).arg("check").assert().code(0);
}

#[test]
fn test_init_without_force_keeps_existing() {
    let temp = project(&[], "# mine\n");

    tfpolicy(&temp)
        .arg("init")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Skipped .tfpolicy.toml"));

    let content = fs::read_to_string(temp.path().join(".tfpolicy.toml")).unwrap();
    assert_eq!(content, "# mine\n");
}

#[test]
fn test_init_force_overwrites() {
    let temp = project(&[], "# mine\n");

    tfpolicy(&temp)
        .args(["init", "--force"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Overwrote .tfpolicy.toml."));

    let content = fs::read_to_string(temp.path().join(".tfpolicy.toml")).unwrap();
    assert!(content.contains("[config]"));
}
