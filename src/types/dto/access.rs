use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::policy::RequirementCheck;

/// Result of a permission lookup for the calling role
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AccessCheckResponse {
    pub role: String,
    pub resource: String,
    pub action: String,
    pub scope: String,

    /// Whether the role may perform the action at the given scope
    pub allowed: bool,

    /// Scope of the first grant for the action, if the role has one
    pub required_scope: Option<String>,
}

/// Requirement evaluation result: `{valid: true}` or `{valid: false, message, code}`
#[derive(Object, Debug, Serialize, Deserialize, PartialEq)]
pub struct RequirementCheckResponse {
    pub category: String,

    pub valid: bool,

    #[oai(skip_serializing_if_is_none)]
    pub message: Option<String>,

    /// Stable failure code, e.g. IDENTITY_VERIFICATION_REQUIRED
    #[oai(skip_serializing_if_is_none)]
    pub code: Option<String>,
}

impl RequirementCheckResponse {
    pub fn new(category: impl Into<String>, check: &RequirementCheck) -> Self {
        Self {
            category: category.into(),
            valid: check.is_valid(),
            message: check.message().map(str::to_string),
            code: check.code().map(|code| code.as_str().to_string()),
        }
    }
}
