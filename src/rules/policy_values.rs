//! Reference values shared by the policy rules

/// Accepted values for `azurerm_storage_account.account_tier`
pub const VALID_ACCOUNT_TIERS: &[&str] = &["Standard", "Premium"];

/// Resource types checked for tags when the rule options name none
pub const DEFAULT_TAGGED_RESOURCE_TYPES: &[&str] = &["azurerm_resource_group", "azurerm_key_vault"];
