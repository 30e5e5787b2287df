//! Foundation tests for the core domain types and errors
//!
//! These tests go through the crate-root re-exports and check the
//! serialization and display behavior the output formats depend on.

mod common;

use tfpolicy::{
    ConfigError, EvalError, Issue, LoadError, Pos, RuleError, RuleName, Severity, SourceRange,
    TfPolicyError,
};

// ============================================================================
// Severity
// ============================================================================

#[test]
fn test_severity_roundtrip_serialization() {
    for severity in [Severity::Notice, Severity::Warning, Severity::Error] {
        let json = assert_ok!(serde_json::to_string(&severity));
        assert_eq!(json, format!("\"{}\"", severity.as_str()));
        let deserialized: Severity = assert_ok!(serde_json::from_str(&json));
        assert_eq!(severity, deserialized);
    }
}

#[test]
fn test_severity_parse_is_case_insensitive() {
    assert_eq!("Error".parse::<Severity>(), Ok(Severity::Error));
    assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warning));
    assert!("fatal".parse::<Severity>().is_err());
}

#[test]
fn test_severity_failure_threshold() {
    let minimum = Severity::Warning;
    assert!(Severity::Error >= minimum);
    assert!(Severity::Warning >= minimum);
    assert!(Severity::Notice < minimum);
}

// ============================================================================
// RuleName
// ============================================================================

#[test]
fn test_rule_name_accepts_builtin_names() {
    for name in [
        "azurerm_resource_missing_tags",
        "azurerm_storage_account_invalid_account_tier",
        "terraform_customised_module_structure",
    ] {
        let rule_name = assert_some!(RuleName::new(name));
        assert_eq!(rule_name.to_string(), name);
    }
}

#[test]
fn test_rule_name_serde_rejects_invalid() {
    let result: Result<RuleName, _> = serde_json::from_str("\"has space\"");
    assert!(result.is_err());

    let result: Result<RuleName, _> = serde_json::from_str("\"\"");
    assert!(result.is_err());
}

// ============================================================================
// SourceRange and Issue
// ============================================================================

#[test]
fn test_source_range_display() {
    let range = SourceRange::new("module.tf", Pos::new(5, 10, 77), Pos::new(8, 4, 110));
    assert_eq!(range.to_string(), "module.tf:5,10-8,4");
}

#[test]
fn test_issue_serialization() {
    let issue = Issue {
        rule: "azurerm_storage_account_invalid_account_tier".to_string(),
        severity: Severity::Error,
        link: String::new(),
        message: "\"Gold\" is an invalid value as Account Tier".to_string(),
        range: SourceRange::new("resource.tf", Pos::new(3, 20, 63), Pos::new(3, 26, 69)),
    };

    let value = assert_ok!(serde_json::to_value(&issue));
    assert_eq!(value["severity"], "error");
    assert_eq!(value["range"]["filename"], "resource.tf");
    assert_eq!(value["range"]["start"]["line"], 3);
    assert_eq!(value["range"]["end"]["column"], 26);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_parse_errors_are_classified() {
    let load: TfPolicyError = LoadError::Parse {
        file: "main.tf".to_string(),
        message: "unexpected end of input".to_string(),
    }
    .into();
    assert!(load.is_parse_error());
    assert_eq!(
        load.to_string(),
        "Parse error in main.tf: unexpected end of input"
    );

    let config_parse = assert_some!(toml::from_str::<toml::Table>("[rules").err());
    let config: TfPolicyError = ConfigError::Parse(config_parse).into();
    assert!(config.is_parse_error());

    let unknown: TfPolicyError = ConfigError::UnknownRule("x".to_string()).into();
    assert!(!unknown.is_parse_error());
    assert_eq!(unknown.to_string(), "Configuration error: Rule not found: x");
}

#[test]
fn test_rule_error_display() {
    let err = RuleError::SchemaMismatch {
        resource: "azurerm_resource_group".to_string(),
        message: "tags is a block".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Schema mismatch in azurerm_resource_group: tags is a block"
    );

    let wrapped: TfPolicyError = err.into();
    assert!(!wrapped.is_parse_error());
}

#[test]
fn test_eval_error_display() {
    assert_eq!(
        EvalError::Unknown("var.tags".to_string()).to_string(),
        "value is unknown: var.tags"
    );
    assert_eq!(
        EvalError::TypeMismatch {
            expected: "string",
            found: "number"
        }
        .to_string(),
        "expected string, found number"
    );
}
