use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;

use crate::audit::{AuditLogger, audit_logger};
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::policy::Role;
use crate::providers::crypto_provider::CryptoProvider;
use crate::providers::password_validator_provider::PasswordValidatorProvider;
use crate::stores::account_store::{AccountStore, NewAccount, role_from_model, security_from_model};
use crate::types::db::account;
use crate::types::internal::context::RequestContext;

/// Result of a credential check
///
/// Wrong passwords and locked accounts are expected outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated {
        account_id: String,
        username: String,
        role: Role,
    },
    InvalidCredentials,
    Locked {
        lock_until: Option<DateTime<Utc>>,
    },
}

/// Account creation and credential verification
///
/// Operations take the connection or transaction to run on; the coordinator
/// decides the transaction boundary.
pub struct AuthenticationProvider {
    store: Arc<AccountStore>,
    crypto_provider: Arc<CryptoProvider>,
    password_validator: Arc<PasswordValidatorProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl AuthenticationProvider {
    pub fn new(
        store: Arc<AccountStore>,
        crypto_provider: Arc<CryptoProvider>,
        password_validator: Arc<PasswordValidatorProvider>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        Self {
            store,
            crypto_provider,
            password_validator,
            audit_logger,
        }
    }

    /// Self-service registration
    ///
    /// # Errors
    /// * `CredentialError::UnknownRole` for a tag that names no role
    /// * `CredentialError::RoleNotSelfAssignable` for `admin`
    /// * `CredentialError::PasswordPolicy` when the password is rejected
    /// * `CredentialError::DuplicateUsername` when the username is taken
    pub async fn register(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        username: &str,
        password: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<account::Model, InternalError> {
        let role = role
            .parse::<Role>()
            .map_err(|_| CredentialError::UnknownRole(role.to_string()))?;

        if role == Role::Admin {
            return Err(CredentialError::RoleNotSelfAssignable(role.to_string()).into());
        }

        self.create_account(ctx, conn, username, password, role, now).await
    }

    /// Create an account with any role, including `admin`
    ///
    /// Only reachable from the CLI.
    pub async fn create_account(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        username: &str,
        password: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<account::Model, InternalError> {
        self.password_validator
            .validate(password, Some(username))
            .map_err(|e| CredentialError::PasswordPolicy(e.to_string()))?;

        let password_hash = self.crypto_provider.hash_password(password)?;

        let model = self
            .store
            .create_account(
                conn,
                NewAccount {
                    username: username.to_string(),
                    password_hash,
                    role,
                },
                now,
            )
            .await?;

        tracing::info!(account_id = %model.id, role = %role, "Account created");
        audit_logger::report(
            self.audit_logger.log_account_created(ctx, &model.id, username, role).await,
            "account_created",
        );

        Ok(model)
    }

    /// Verify credentials and apply the login transition
    ///
    /// A locked account is refused before the password is looked at. A wrong
    /// password runs the atomic failed-login update; if that attempt locks the
    /// account the outcome is `Locked`. Success clears attempts and lock.
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, InternalError> {
        let Some(model) = self.store.find_by_username(conn, username).await? else {
            audit_logger::report(
                self.audit_logger
                    .log_login_failure(ctx, username, None, "unknown_username", None)
                    .await,
                "login_failure",
            );
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let security = security_from_model(&model)?;
        if security.is_locked(now) {
            tracing::debug!(account_id = %model.id, "Login refused for locked account");
            audit_logger::report(
                self.audit_logger
                    .log_login_failure(ctx, username, Some(&model.id), "account_locked", None)
                    .await,
                "login_failure",
            );
            return Ok(LoginOutcome::Locked {
                lock_until: security.lock_until,
            });
        }

        if !self.crypto_provider.verify_password(password, &model.password_hash)? {
            let updated = self.store.record_failed_login(conn, &model.id, now).await?;

            audit_logger::report(
                self.audit_logger
                    .log_login_failure(
                        ctx,
                        username,
                        Some(&model.id),
                        "invalid_password",
                        Some(updated.login_attempts),
                    )
                    .await,
                "login_failure",
            );

            if let Some(lock_until) = updated.lock_until.filter(|_| updated.is_locked(now)) {
                tracing::warn!(account_id = %model.id, "Account locked after {} failed logins", updated.login_attempts);
                audit_logger::report(
                    self.audit_logger
                        .log_account_locked(ctx, &model.id, updated.login_attempts, lock_until)
                        .await,
                    "account_locked",
                );
                return Ok(LoginOutcome::Locked {
                    lock_until: Some(lock_until),
                });
            }

            return Ok(LoginOutcome::InvalidCredentials);
        }

        self.store.record_successful_login(conn, &model.id, now).await?;

        Ok(LoginOutcome::Authenticated {
            role: role_from_model(&model)?,
            account_id: model.id,
            username: model.username,
        })
    }

    /// Clear attempts and lock of an account
    pub async fn unlock(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), InternalError> {
        self.store.record_successful_login(conn, account_id, now).await?;

        tracing::info!(account_id = %account_id, "Account unlocked");
        audit_logger::report(
            self.audit_logger.log_account_unlocked(ctx, account_id).await,
            "account_unlocked",
        );

        Ok(())
    }
}
