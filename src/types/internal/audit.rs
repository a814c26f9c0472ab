use std::collections::HashMap;
use std::fmt;

/// Event types for audit logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    AccountCreated,
    LoginSuccess,
    LoginFailure,
    AccountLocked,
    AccountUnlocked,
    JwtIssued,
    JwtValidationFailure,
    PermissionDenied,
    RequirementNotMet,
    RateLimited,
    OtpSent,
    OtpThrottled,
    OtpVerified,
    OtpVerificationFailed,
    IdentityVerified,
    AddressAdded,
    CliSessionStart,
    Custom(String),
}

impl EventType {
    /// Convert EventType to string representation for database storage
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccountCreated => "account_created",
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::AccountLocked => "account_locked",
            Self::AccountUnlocked => "account_unlocked",
            Self::JwtIssued => "jwt_issued",
            Self::JwtValidationFailure => "jwt_validation_failure",
            Self::PermissionDenied => "permission_denied",
            Self::RequirementNotMet => "requirement_not_met",
            Self::RateLimited => "rate_limited",
            Self::OtpSent => "otp_sent",
            Self::OtpThrottled => "otp_throttled",
            Self::OtpVerified => "otp_verified",
            Self::OtpVerificationFailed => "otp_verification_failed",
            Self::IdentityVerified => "identity_verified",
            Self::AddressAdded => "address_added",
            Self::CliSessionStart => "cli_session_start",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        EventType::Custom(s.to_string())
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType::Custom(s)
    }
}

/// Audit event structure for building and storing audit logs
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub user_id: String,
    pub ip_address: Option<String>,
    pub jwt_id: Option<String>,
    pub data: HashMap<String, serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event with the specified event type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            user_id: "unknown".to_string(),
            ip_address: None,
            jwt_id: None,
            data: HashMap::new(),
        }
    }
}
