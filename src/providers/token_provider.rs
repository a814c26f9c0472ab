use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::audit::{AuditLogger, audit_logger};
use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::policy::Role;
use crate::types::internal::auth::Claims;
use crate::types::internal::context::RequestContext;

/// Access token lifetime
pub const JWT_EXPIRATION_MINUTES: i64 = 15;

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jwt_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Provides JWT generation and validation
pub struct TokenProvider {
    secret_manager: Arc<SecretManager>,
    jwt_expiration_minutes: i64,
    audit_logger: Arc<AuditLogger>,
}

impl TokenProvider {
    pub fn new(secret_manager: Arc<SecretManager>, audit_logger: Arc<AuditLogger>) -> Self {
        Self {
            secret_manager,
            jwt_expiration_minutes: JWT_EXPIRATION_MINUTES,
            audit_logger,
        }
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.jwt_expiration_minutes * 60
    }

    /// Sign an access token for `account_id` carrying `role`
    ///
    /// Logs JWT issuance to the audit database at point of action.
    pub async fn generate_jwt(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        role: Role,
    ) -> Result<IssuedToken, InternalError> {
        let now = Utc::now().timestamp();
        let expiration = now + self.expires_in_seconds();

        let expires_at = DateTime::from_timestamp(expiration, 0)
            .ok_or_else(|| InternalError::parse("timestamp", format!("Invalid expiration timestamp: {}", expiration)))?;

        let jwt_id = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: account_id.to_string(),
            role,
            exp: expiration,
            iat: now,
            jti: jwt_id.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
        )
        .map_err(|e| InternalError::crypto("jwt_generation", format!("Failed to generate JWT: {}", e)))?;

        audit_logger::report(
            self.audit_logger.log_jwt_issued(ctx, account_id, &jwt_id, expires_at).await,
            "jwt_issued",
        );

        Ok(IssuedToken {
            token,
            jwt_id,
            expires_at,
        })
    }

    /// Validate a JWT and return its claims
    ///
    /// Validation failures are written to the audit log before returning.
    pub async fn validate_jwt(&self, ctx: &RequestContext, token: &str) -> Result<Claims, InternalError> {
        match self.decode(token) {
            Ok(claims) => Ok(claims),
            Err(e) => {
                let (reason, err) = match e.kind() {
                    ErrorKind::ExpiredSignature => (
                        "expired",
                        InternalError::from(CredentialError::ExpiredToken("jwt".to_string())),
                    ),
                    ErrorKind::InvalidSignature => (
                        "invalid_signature",
                        InternalError::from(CredentialError::invalid_token("jwt", "invalid signature")),
                    ),
                    _ => (
                        "malformed",
                        InternalError::from(CredentialError::invalid_token("jwt", "malformed")),
                    ),
                };

                tracing::debug!("JWT validation failed: {}", reason);
                audit_logger::report(
                    self.audit_logger.log_jwt_validation_failure(ctx, reason).await,
                    "jwt_validation_failure",
                );

                Err(err)
            }
        }
    }

    /// Claims of a valid token, without touching the audit log
    ///
    /// For request classification only; handlers still call `validate_jwt`.
    pub fn peek_claims(&self, token: &str) -> Option<Claims> {
        self.decode(token).ok()
    }

    fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
            &validation,
        )
        .map(|token_data| token_data.claims)
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret_manager", &"<redacted>")
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .finish()
    }
}

impl fmt::Display for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenProvider {{ jwt_expiration: {}min }}", self.jwt_expiration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::AuditStore;
    use crate::test::utils::{TEST_JWT_SECRET, setup_test_audit_db, test_secret_manager};

    async fn provider() -> (TokenProvider, Arc<AuditStore>) {
        let audit_store = Arc::new(AuditStore::new(setup_test_audit_db().await));
        let audit_logger = Arc::new(AuditLogger::new(audit_store.clone()));
        (TokenProvider::new(test_secret_manager(), audit_logger), audit_store)
    }

    #[tokio::test]
    async fn test_jwt_expiration_is_15_minutes() {
        let (tokens, _) = provider().await;
        let ctx = RequestContext::for_system("test");

        let issued = tokens.generate_jwt(&ctx, "acc-1", Role::Artisan).await.unwrap();
        let claims = tokens.validate_jwt(&ctx, &issued.token).await.unwrap();

        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.sub, "acc-1");
        assert_eq!(claims.role, Role::Artisan);
        assert_eq!(claims.jti, issued.jwt_id);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[tokio::test]
    async fn test_issuance_is_audited() {
        let (tokens, audit_store) = provider().await;
        let ctx = RequestContext::for_system("test");

        tokens.generate_jwt(&ctx, "acc-2", Role::Customer).await.unwrap();

        let events = audit_store.events_of_type("jwt_issued").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, "acc-2");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (tokens, audit_store) = provider().await;
        let ctx = RequestContext::for_system("test");
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: "acc-3".to_string(),
            role: Role::Customer,
            exp: now - 3600,
            iat: now - 4500,
            jti: "old".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap();

        let result = tokens.validate_jwt(&ctx, &token).await;

        assert!(matches!(result, Err(InternalError::Credential(CredentialError::ExpiredToken(_)))));
        assert_eq!(audit_store.events_of_type("jwt_validation_failure").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let (tokens, _) = provider().await;
        let ctx = RequestContext::for_system("test");
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: "acc-4".to_string(),
            role: Role::Admin,
            exp: now + 600,
            iat: now,
            jti: "forged".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"attacker-controlled-secret-of-32-bytes!!"),
        )
        .unwrap();

        assert!(matches!(
            tokens.validate_jwt(&ctx, &token).await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }

    #[tokio::test]
    async fn test_peek_claims_is_silent() {
        let (tokens, audit_store) = provider().await;
        let ctx = RequestContext::for_system("test");
        let issued = tokens.generate_jwt(&ctx, "acc-5", Role::Distributor).await.unwrap();

        assert_eq!(tokens.peek_claims(&issued.token).map(|c| c.role), Some(Role::Distributor));
        assert!(tokens.peek_claims("garbage").is_none());
        assert!(audit_store.events_of_type("jwt_validation_failure").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (tokens, _) = provider().await;
        let ctx = RequestContext::for_system("test");

        assert!(matches!(
            tokens.validate_jwt(&ctx, "not.a.jwt").await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }
}
