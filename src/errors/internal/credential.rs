use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("User already exists: {0}")]
    DuplicateUsername(String),

    #[error("Role cannot be self-assigned: {0}")]
    RoleNotSelfAssignable(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Password rejected: {0}")]
    PasswordPolicy(String),

    #[error("Invalid token: {token_type} - {reason}")]
    InvalidToken {
        token_type: String,
        reason: String,
    },

    #[error("Expired token: {0}")]
    ExpiredToken(String),
}

impl CredentialError {
    pub fn invalid_token(token_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            token_type: token_type.into(),
            reason: reason.into(),
        }
    }
}
