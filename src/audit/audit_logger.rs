use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::audit::AuditBuilder;
use crate::errors::InternalError;
use crate::policy::{Action, RequirementFailureCode, Resource, Role, Scope};
use crate::stores::audit_store::AuditStore;
use crate::types::internal::account_security::{OtpDenial, OtpIssueKind, OtpVerifyOutcome};
use crate::types::internal::audit::EventType;
use crate::types::internal::context::RequestContext;

/// Writes security-relevant events to the audit database
///
/// The actor always comes from the RequestContext; the account an event is
/// about is recorded separately as `target_account_id`.
pub struct AuditLogger {
    pub audit_store: Arc<AuditStore>,
}

impl AuditLogger {
    pub fn new(audit_store: Arc<AuditStore>) -> Self {
        Self { audit_store }
    }

    /// Create an AuditBuilder for custom audit events
    pub fn builder(&self, event_type: impl Into<EventType>) -> AuditBuilder {
        AuditBuilder::new(self.audit_store.clone(), event_type)
    }

    fn event(&self, ctx: &RequestContext, event_type: EventType) -> AuditBuilder {
        self.builder(event_type).with_context(ctx)
    }

    pub async fn log_cli_session_start(
        &self,
        ctx: &RequestContext,
        command_name: &str,
        args: Vec<String>,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::CliSessionStart)
            .add_field("command_name", command_name)
            .add_field("args", args)
            .write()
            .await
    }

    pub async fn log_account_created(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        username: &str,
        role: Role,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::AccountCreated)
            .add_field("target_account_id", account_id)
            .add_field("username", username)
            .add_field("role", role)
            .write()
            .await
    }

    pub async fn log_login_success(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        jwt_id: &str,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::LoginSuccess)
            .user_id(account_id)
            .jwt_id(jwt_id)
            .write()
            .await
    }

    /// Failed login; the attempted username is stored hashed
    pub async fn log_login_failure(
        &self,
        ctx: &RequestContext,
        username: &str,
        account_id: Option<&str>,
        reason: &str,
        login_attempts: Option<u32>,
    ) -> Result<(), InternalError> {
        let mut builder = self
            .event(ctx, EventType::LoginFailure)
            .add_sensitive("username", username)
            .add_field("reason", reason);

        if let Some(account_id) = account_id {
            builder = builder.user_id(account_id);
        }
        if let Some(attempts) = login_attempts {
            builder = builder.add_field("login_attempts", attempts);
        }

        builder.write().await
    }

    pub async fn log_account_locked(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        login_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::AccountLocked)
            .user_id(account_id)
            .add_field("login_attempts", login_attempts)
            .add_field("lock_until", lock_until.to_rfc3339())
            .write()
            .await
    }

    pub async fn log_account_unlocked(&self, ctx: &RequestContext, account_id: &str) -> Result<(), InternalError> {
        self.event(ctx, EventType::AccountUnlocked)
            .add_field("target_account_id", account_id)
            .write()
            .await
    }

    pub async fn log_jwt_issued(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        jwt_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::JwtIssued)
            .user_id(account_id)
            .jwt_id(jwt_id)
            .add_field("expires_at", expires_at.to_rfc3339())
            .write()
            .await
    }

    pub async fn log_jwt_validation_failure(&self, ctx: &RequestContext, reason: &str) -> Result<(), InternalError> {
        self.event(ctx, EventType::JwtValidationFailure)
            .add_field("failure_reason", reason)
            .write()
            .await
    }

    pub async fn log_permission_denied(
        &self,
        ctx: &RequestContext,
        resource: Resource,
        action: Action,
        scope: Scope,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::PermissionDenied)
            .add_field("role", ctx.role())
            .add_field("resource", resource)
            .add_field("action", action)
            .add_field("scope", scope)
            .write()
            .await
    }

    pub async fn log_requirement_not_met(
        &self,
        ctx: &RequestContext,
        category: &str,
        code: RequirementFailureCode,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::RequirementNotMet)
            .add_field("role", ctx.role())
            .add_field("category", category)
            .add_field("code", code)
            .write()
            .await
    }

    pub async fn log_rate_limited(
        &self,
        ctx: &RequestContext,
        role: Role,
        max_requests: u32,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::RateLimited)
            .add_field("role", role)
            .add_field("max_requests", max_requests)
            .write()
            .await
    }

    pub async fn log_otp_sent(
        &self,
        ctx: &RequestContext,
        kind: OtpIssueKind,
        sends_today: u32,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::OtpSent)
            .add_field("kind", kind.as_str())
            .add_field("sends_today", sends_today)
            .write()
            .await
    }

    pub async fn log_otp_throttled(&self, ctx: &RequestContext, denial: OtpDenial) -> Result<(), InternalError> {
        self.event(ctx, EventType::OtpThrottled)
            .add_field("reason", format!("{:?}", denial))
            .write()
            .await
    }

    pub async fn log_otp_verification(&self, ctx: &RequestContext, outcome: OtpVerifyOutcome) -> Result<(), InternalError> {
        let event_type = if outcome.is_verified() {
            EventType::OtpVerified
        } else {
            EventType::OtpVerificationFailed
        };

        self.event(ctx, event_type)
            .add_field("outcome", format!("{:?}", outcome))
            .write()
            .await
    }

    pub async fn log_identity_verified(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        verified: bool,
    ) -> Result<(), InternalError> {
        self.event(ctx, EventType::IdentityVerified)
            .add_field("target_account_id", account_id)
            .add_field("verified", verified)
            .write()
            .await
    }

    pub async fn log_address_added(&self, ctx: &RequestContext, address_id: &str) -> Result<(), InternalError> {
        self.event(ctx, EventType::AddressAdded)
            .add_field("address_id", address_id)
            .write()
            .await
    }
}

/// Log an audit write failure without failing the caller
pub(crate) fn report(result: Result<(), InternalError>, event: &str) {
    if let Err(audit_err) = result {
        tracing::error!("Failed to write {} audit event: {}", event, audit_err);
    }
}
