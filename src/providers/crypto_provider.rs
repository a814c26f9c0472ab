use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::types::internal::account_security::OTP_LENGTH;

type HmacSha256 = Hmac<Sha256>;

/// Cryptographic operations provider
///
/// Password hashing uses Argon2id with the pepper as the Argon2 secret. OTPs
/// are stored as HMAC-SHA256 digests keyed by the same pepper.
pub struct CryptoProvider {
    secret_manager: Arc<SecretManager>,
}

impl CryptoProvider {
    pub fn new(secret_manager: Arc<SecretManager>) -> Self {
        Self { secret_manager }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.secret_manager.pepper().as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }

    /// Hash a password into a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);

        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| InternalError::crypto("hash_password", e.to_string()))
    }

    /// Check a password against a stored PHC string
    ///
    /// A mismatch is `Ok(false)`; only unreadable hashes are errors.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, InternalError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| InternalError::crypto("parse_password_hash", e.to_string()))?;

        match self.argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(InternalError::crypto("verify_password", e.to_string())),
        }
    }

    /// Compute HMAC-SHA256 and return it as lowercase hex
    pub fn hmac_sha256(&self, key: &str, value: &str) -> Result<String, InternalError> {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| InternalError::crypto("hmac_init", e.to_string()))?;
        mac.update(value.as_bytes());
        Ok(format!("{:x}", mac.finalize().into_bytes()))
    }

    /// Digest under which an OTP is stored
    pub fn otp_digest(&self, code: &str) -> Result<String, InternalError> {
        self.hmac_sha256(self.secret_manager.pepper(), code)
    }

    /// Compare a submitted code with a stored digest in constant time
    pub fn otp_matches(&self, code: &str, stored_digest: &str) -> bool {
        match self.otp_digest(code.trim()) {
            Ok(candidate) => constant_time_eq(candidate.as_bytes(), stored_digest.as_bytes()),
            Err(e) => {
                tracing::error!("Failed to digest OTP candidate: {}", e);
                false
            }
        }
    }

    /// Generate a numeric OTP of `OTP_LENGTH` digits
    pub fn generate_otp_code(&self) -> String {
        let mut rng = rand::rng();
        (0..OTP_LENGTH)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    /// Generate a 20-character password from letters, digits and symbols
    pub fn generate_secure_password(&self) -> String {
        const PASSWORD_LENGTH: usize = 20;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                 abcdefghijklmnopqrstuvwxyz\
                                 0123456789\
                                 !@#$%^&*()_+-=[]{}|;:,.<>?";

        let mut rng = rand::rng();
        (0..PASSWORD_LENGTH)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
