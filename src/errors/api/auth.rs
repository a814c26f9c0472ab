use crate::errors::internal::{AccountError, CredentialError, InternalError};
use chrono::{DateTime, Utc};
use poem_openapi::{ApiResponse, payload::Json};
use std::fmt;

use super::ApiErrorResponse;

/// Authentication error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid username or password
    #[oai(status = 401)]
    InvalidCredentials(Json<ApiErrorResponse>),

    /// Account is temporarily locked after repeated failures
    #[oai(status = 423)]
    AccountLocked(Json<ApiErrorResponse>),

    /// Username already exists
    #[oai(status = 400)]
    DuplicateUsername(Json<ApiErrorResponse>),

    /// Request payload failed validation
    #[oai(status = 400)]
    InvalidRequest(Json<ApiErrorResponse>),

    /// Invalid or malformed JWT
    #[oai(status = 401)]
    InvalidToken(Json<ApiErrorResponse>),

    /// JWT has expired
    #[oai(status = 401)]
    ExpiredToken(Json<ApiErrorResponse>),

    /// Daily OTP send or resend cap reached
    #[oai(status = 429)]
    OtpLimitReached(Json<ApiErrorResponse>),

    /// OTP missing, expired, wrong or exhausted
    #[oai(status = 401)]
    OtpRejected(Json<ApiErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ApiErrorResponse>),
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(Json(ApiErrorResponse::new(
            "invalid_credentials",
            "Invalid username or password",
            401,
        )))
    }

    pub fn account_locked(lock_until: Option<DateTime<Utc>>) -> Self {
        let message = match lock_until {
            Some(until) => format!(
                "Account is locked due to repeated failed logins. Try again after {}",
                until.to_rfc3339()
            ),
            None => "Account is locked due to repeated failed logins".to_string(),
        };
        AuthError::AccountLocked(Json(ApiErrorResponse::new("account_locked", message, 423)))
    }

    pub fn duplicate_username() -> Self {
        AuthError::DuplicateUsername(Json(ApiErrorResponse::new(
            "duplicate_username",
            "Username already exists",
            400,
        )))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AuthError::InvalidRequest(Json(ApiErrorResponse::new("invalid_request", message, 400)))
    }

    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(Json(ApiErrorResponse::new(
            "invalid_token",
            "Invalid or malformed JWT",
            401,
        )))
    }

    pub fn expired_token() -> Self {
        AuthError::ExpiredToken(Json(ApiErrorResponse::new("expired_token", "JWT has expired", 401)))
    }

    pub fn otp_limit_reached(message: impl Into<String>) -> Self {
        AuthError::OtpLimitReached(Json(ApiErrorResponse::new("otp_limit_reached", message, 429)))
    }

    pub fn otp_rejected(message: impl Into<String>) -> Self {
        AuthError::OtpRejected(Json(ApiErrorResponse::new("otp_rejected", message, 401)))
    }

    /// Convert InternalError to AuthError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Database(_) => {
                tracing::error!("Database error in auth operation: {}", err);
                Self::internal_server_error()
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::internal_server_error()
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::internal_server_error()
            }

            InternalError::Credential(CredentialError::DuplicateUsername(username)) => {
                tracing::warn!("Duplicate username attempt: {}", username);
                Self::duplicate_username()
            }
            InternalError::Credential(CredentialError::RoleNotSelfAssignable(role)) => {
                tracing::warn!("Registration attempted with role {}", role);
                Self::invalid_request(format!("Role '{}' cannot be requested at registration", role))
            }
            InternalError::Credential(CredentialError::UnknownRole(role)) => {
                Self::invalid_request(format!("Unknown role '{}'", role))
            }
            InternalError::Credential(CredentialError::PasswordPolicy(reason)) => {
                Self::invalid_request(reason.clone())
            }
            InternalError::Credential(CredentialError::InvalidToken { token_type, reason }) => {
                tracing::debug!("Invalid token: {} - {}", token_type, reason);
                Self::invalid_token()
            }
            InternalError::Credential(CredentialError::ExpiredToken(token_type)) => {
                tracing::debug!("Expired token: {}", token_type);
                Self::expired_token()
            }
            // Unknown usernames look identical to wrong passwords from outside
            InternalError::Account(AccountError::UsernameNotFound(_)) => {
                tracing::debug!("Login for unknown username");
                Self::invalid_credentials()
            }

            _ => {
                tracing::error!("Unexpected error in auth operation: {}", err);
                Self::internal_server_error()
            }
        }
    }

    fn internal_server_error() -> Self {
        AuthError::InternalError(Json(ApiErrorResponse::new(
            "internal_error",
            "An internal error occurred",
            500,
        )))
    }

    fn body(&self) -> &ApiErrorResponse {
        match self {
            AuthError::InvalidCredentials(json)
            | AuthError::AccountLocked(json)
            | AuthError::DuplicateUsername(json)
            | AuthError::InvalidRequest(json)
            | AuthError::InvalidToken(json)
            | AuthError::ExpiredToken(json)
            | AuthError::OtpLimitReached(json)
            | AuthError::OtpRejected(json)
            | AuthError::InternalError(json) => &json.0,
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        self.body().message.clone()
    }

    pub fn status_code(&self) -> u16 {
        self.body().status_code
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
