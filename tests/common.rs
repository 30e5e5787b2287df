//! Test utilities for tfpolicy integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

/// Write `files` (name, content) into `dir`, creating it when needed
pub fn write_module(dir: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

/// Config enabling every built-in rule, requiring tags Foo and Bar
pub const ALL_RULES_CONFIG: &str = r#"
[rules]
azurerm_storage_account_invalid_account_tier = true
terraform_customised_module_structure = true

[rules.azurerm_resource_missing_tags]
enabled = true
tags = ["Foo", "Bar"]
"#;

/// A module that satisfies every built-in rule
pub const CLEAN_MODULE: &[(&str, &str)] = &[
    (
        "main.tf",
        r#"
resource "azurerm_resource_group" "rg" {
  name     = "rg"
  location = "West Europe"
  tags = {
    Foo = "a"
    Bar = "b"
  }
}

resource "azurerm_storage_account" "sa" {
  name         = "sa"
  account_tier = "Standard"
}
"#,
    ),
    ("data.tf", ""),
    ("locals.tf", ""),
];

/// A module with one issue per built-in rule
pub const DIRTY_MODULE: &[(&str, &str)] = &[
    (
        "main.tf",
        r#"
resource "azurerm_resource_group" "rg" {
  name = "rg"
}

resource "azurerm_storage_account" "sa" {
  name         = "sa"
  account_tier = "Gold"
}
"#,
    ),
    ("data.tf", ""),
];
