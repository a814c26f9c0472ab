use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for account registration
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Unique username
    #[oai(validator(min_length = 3, max_length = 64))]
    pub username: String,

    /// Password (stored as an Argon2id hash)
    #[oai(validator(min_length = 8, max_length = 128))]
    pub password: String,

    /// Requested role: customer, artisan or distributor
    pub role: String,
}

/// Response model for a newly registered account
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Account ID (UUID)
    pub account_id: String,

    pub username: String,

    pub role: String,
}

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,
}

/// Response model containing the access token
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

/// Response model for a successfully issued OTP
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct OtpIssuedResponse {
    /// "send" or "resend"
    pub kind: String,

    /// When the code stops being accepted (ISO 8601)
    pub expires_at: String,

    /// Issuances still available today (UTC)
    pub sends_remaining_today: u32,
}

/// Request model for OTP verification
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct OtpVerifyRequest {
    /// The code delivered to the account holder
    #[oai(validator(min_length = 1, max_length = 16))]
    pub code: String,
}
