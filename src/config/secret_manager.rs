use std::fmt;

use thiserror::Error;

use crate::config::{EnvironmentProvider, SecretConfig, SystemEnvironment};

/// Custom error type for secret-related failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength {
        secret_name: String,
        expected: usize,
        actual: usize,
    },
}

/// Centralized manager for application secrets
///
/// `JWT_SECRET` signs access tokens. `PEPPER` is the Argon2 secret for
/// password hashes and the HMAC key for stored OTP digests.
pub struct SecretManager {
    jwt_secret: String,
    pepper: String,
}

impl SecretManager {
    const JWT_SECRET_MIN_LENGTH: usize = 32;
    const PEPPER_MIN_LENGTH: usize = 16;

    /// Load and validate all secrets from the process environment
    pub fn init() -> Result<Self, SecretError> {
        Self::init_with(&SystemEnvironment)
    }

    /// Load and validate all secrets from `env`
    pub fn init_with(env: &dyn EnvironmentProvider) -> Result<Self, SecretError> {
        let jwt_secret = Self::load_secret(env, &Self::jwt_config())?;
        let pepper = Self::load_secret(env, &Self::pepper_config())?;

        Ok(Self { jwt_secret, pepper })
    }

    /// Build from explicit values with the same validation rules
    pub fn from_values(jwt_secret: &str, pepper: &str) -> Result<Self, SecretError> {
        Self::check_length(&Self::jwt_config(), jwt_secret)?;
        Self::check_length(&Self::pepper_config(), pepper)?;

        Ok(Self {
            jwt_secret: jwt_secret.to_string(),
            pepper: pepper.to_string(),
        })
    }

    fn jwt_config() -> SecretConfig {
        SecretConfig::env("JWT_SECRET").min_length(Self::JWT_SECRET_MIN_LENGTH)
    }

    fn pepper_config() -> SecretConfig {
        SecretConfig::env("PEPPER").min_length(Self::PEPPER_MIN_LENGTH)
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn pepper(&self) -> &str {
        &self.pepper
    }

    pub(crate) fn load_secret(env: &dyn EnvironmentProvider, config: &SecretConfig) -> Result<String, SecretError> {
        let value = match env.get_var(config.name()) {
            Some(value) => value,
            None if !config.required => return Ok(String::new()),
            None => {
                return Err(SecretError::Missing {
                    secret_name: config.name().to_string(),
                });
            }
        };

        Self::check_length(config, &value)?;
        Ok(value)
    }

    fn check_length(config: &SecretConfig, value: &str) -> Result<(), SecretError> {
        match config.min_length {
            Some(min_len) if value.len() < min_len => Err(SecretError::InvalidLength {
                secret_name: config.name().to_string(),
                expected: min_len,
                actual: value.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_secret", &"<redacted>")
            .field("pepper", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 2 }}")
    }
}
