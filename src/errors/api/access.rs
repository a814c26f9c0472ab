use crate::errors::internal::{AccountError, CredentialError, InternalError};
use crate::policy::{Action, RequirementFailure, Resource, Scope};
use poem_openapi::{ApiResponse, payload::Json};
use std::fmt;

use super::ApiErrorResponse;

/// Authorization error types for policy-gated endpoints
#[derive(ApiResponse, Debug)]
pub enum AccessError {
    /// Invalid or malformed JWT
    #[oai(status = 401)]
    InvalidToken(Json<ApiErrorResponse>),

    /// JWT has expired
    #[oai(status = 401)]
    ExpiredToken(Json<ApiErrorResponse>),

    /// Caller's role lacks the permission
    #[oai(status = 403)]
    PermissionDenied(Json<ApiErrorResponse>),

    /// Caller's account does not satisfy a requirement; `error` holds the stable code
    #[oai(status = 403)]
    RequirementNotMet(Json<ApiErrorResponse>),

    /// Request parameters failed validation
    #[oai(status = 400)]
    InvalidRequest(Json<ApiErrorResponse>),

    /// Target entity does not exist
    #[oai(status = 404)]
    NotFound(Json<ApiErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ApiErrorResponse>),
}

impl AccessError {
    pub fn invalid_token() -> Self {
        AccessError::InvalidToken(Json(ApiErrorResponse::new(
            "invalid_token",
            "Invalid or malformed JWT",
            401,
        )))
    }

    pub fn expired_token() -> Self {
        AccessError::ExpiredToken(Json(ApiErrorResponse::new("expired_token", "JWT has expired", 401)))
    }

    pub fn permission_denied(resource: Resource, action: Action, scope: Scope) -> Self {
        AccessError::PermissionDenied(Json(ApiErrorResponse::new(
            "permission_denied",
            format!("Not allowed to {} {} with scope {}", action, resource, scope),
            403,
        )))
    }

    pub fn requirement_not_met(failure: &RequirementFailure) -> Self {
        AccessError::RequirementNotMet(Json(ApiErrorResponse::new(
            failure.code.as_str(),
            failure.message.clone(),
            403,
        )))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AccessError::InvalidRequest(Json(ApiErrorResponse::new("invalid_request", message, 400)))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AccessError::NotFound(Json(ApiErrorResponse::new("not_found", message, 404)))
    }

    /// Convert InternalError to AccessError, logging details that are not exposed
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Credential(CredentialError::InvalidToken { token_type, reason }) => {
                tracing::debug!("Invalid token: {} - {}", token_type, reason);
                Self::invalid_token()
            }
            InternalError::Credential(CredentialError::ExpiredToken(token_type)) => {
                tracing::debug!("Expired token: {}", token_type);
                Self::expired_token()
            }
            InternalError::Account(AccountError::AccountNotFound(id)) => {
                tracing::debug!("Account not found: {}", id);
                Self::not_found("Account not found")
            }
            _ => {
                tracing::error!("Unexpected error in access operation: {}", err);
                Self::internal_server_error()
            }
        }
    }

    fn internal_server_error() -> Self {
        AccessError::InternalError(Json(ApiErrorResponse::new(
            "internal_error",
            "An internal error occurred",
            500,
        )))
    }

    fn body(&self) -> &ApiErrorResponse {
        match self {
            AccessError::InvalidToken(json)
            | AccessError::ExpiredToken(json)
            | AccessError::PermissionDenied(json)
            | AccessError::RequirementNotMet(json)
            | AccessError::InvalidRequest(json)
            | AccessError::NotFound(json)
            | AccessError::InternalError(json) => &json.0,
        }
    }

    pub fn message(&self) -> String {
        self.body().message.clone()
    }

    /// Error code identifier, e.g. `permission_denied` or `ADDRESS_REQUIRED`
    pub fn code(&self) -> &str {
        &self.body().error
    }

    pub fn status_code(&self) -> u16 {
        self.body().status_code
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_failure_exposes_stable_code() {
        let err = AccessError::requirement_not_met(&RequirementFailure::address_required());

        assert_eq!(err.code(), "ADDRESS_REQUIRED");
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_permission_denied_names_the_action() {
        let err = AccessError::permission_denied(Resource::Inventory, Action::Delete, Scope::All);

        assert_eq!(err.code(), "permission_denied");
        assert_eq!(err.message(), "Not allowed to delete inventory with scope all");
    }

    #[test]
    fn test_missing_account_maps_to_not_found() {
        let err = AccessError::from_internal_error(AccountError::AccountNotFound("x".to_string()).into());

        assert!(matches!(err, AccessError::NotFound(_)));
    }

    #[test]
    fn test_infrastructure_errors_are_generic() {
        let err = AccessError::from_internal_error(InternalError::parse("timestamp", "out of range"));

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "An internal error occurred");
    }
}
