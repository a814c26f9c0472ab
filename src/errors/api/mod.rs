// API-facing error types
pub mod access;
pub mod auth;

use poem_openapi::Object;

// Re-exports for convenience
pub use access::AccessError;
pub use auth::AuthError;

/// Standardized error body shared by all API error variants
#[derive(Object, Debug, Clone)]
pub struct ApiErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

impl ApiErrorResponse {
    pub(crate) fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}
