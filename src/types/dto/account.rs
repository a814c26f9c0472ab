use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for adding an address to the caller's account
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AddressRequest {
    #[oai(validator(min_length = 1, max_length = 200))]
    pub line1: String,

    #[oai(validator(min_length = 1, max_length = 100))]
    pub city: String,

    #[oai(validator(min_length = 1, max_length = 20))]
    pub postal_code: String,

    #[oai(validator(min_length = 1, max_length = 100))]
    pub country: String,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub id: String,
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,

    /// Creation time (ISO 8601)
    pub created_at: String,
}

/// Account overview including its lockout state
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub username: String,
    pub role: String,
    pub is_identity_verified: bool,
    pub address_count: u64,
    pub login_attempts: u32,

    /// Derived from lock_until at response time
    pub locked: bool,

    /// End of the current or most recent lock (ISO 8601)
    pub lock_until: Option<String>,
}

/// Outcome of an out-of-band identity check, recorded by an administrator
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct IdentityVerificationRequest {
    pub verified: bool,
}
