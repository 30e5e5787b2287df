//! Configuration file parsing and validation

pub mod policy_toml;

pub use policy_toml::{
    CallModuleType, Config, CoreConfig, DEFAULT_CONFIG_FILE, RuleSettings, RuleValue,
};
