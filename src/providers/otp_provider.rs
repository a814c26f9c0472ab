use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;

use crate::audit::{AuditLogger, audit_logger};
use crate::errors::InternalError;
use crate::providers::crypto_provider::CryptoProvider;
use crate::stores::account_store::{AccountStore, security_from_model};
use crate::types::internal::account_security::{
    MAX_OTP_SENDS_PER_DAY, OtpDenial, OtpIssueDecision, OtpIssueKind, OtpVerifyOutcome,
};
use crate::types::internal::context::RequestContext;

/// Channel a one-time password is handed to once it has been issued
pub trait OtpDelivery: Send + Sync {
    fn deliver(&self, recipient: &str, code: &str) -> Result<(), InternalError>;
}

/// Delivery that writes the code to the application log
///
/// Used until an SMS or e-mail gateway is wired in.
#[derive(Debug, Default)]
pub struct LogOtpDelivery;

impl OtpDelivery for LogOtpDelivery {
    fn deliver(&self, recipient: &str, code: &str) -> Result<(), InternalError> {
        tracing::info!(target: "otp_delivery", recipient = %recipient, code = %code, "Delivering one-time password");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OtpIssueResult {
    Issued {
        kind: OtpIssueKind,
        expires_at: DateTime<Utc>,
        sends_remaining_today: u32,
    },
    Denied(OtpDenial),
}

/// Issues and verifies one-time passwords against the stored OTP state
///
/// Each operation reads, decides and writes the state; callers run it inside
/// a transaction so concurrent requests cannot both spend the same budget.
pub struct OtpProvider {
    store: Arc<AccountStore>,
    crypto_provider: Arc<CryptoProvider>,
    delivery: Arc<dyn OtpDelivery>,
    audit_logger: Arc<AuditLogger>,
}

impl OtpProvider {
    pub fn new(
        store: Arc<AccountStore>,
        crypto_provider: Arc<CryptoProvider>,
        delivery: Arc<dyn OtpDelivery>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        Self {
            store,
            crypto_provider,
            delivery,
            audit_logger,
        }
    }

    /// Issue a code if today's budget allows it and hand it to the delivery channel
    pub async fn issue(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        account_id: &str,
        requested: OtpIssueKind,
        now: DateTime<Utc>,
    ) -> Result<OtpIssueResult, InternalError> {
        let model = self.store.get_by_id(conn, account_id).await?;
        let mut security = security_from_model(&model)?;

        let kind = match security.otp.decide_issue(requested, now) {
            OtpIssueDecision::Allowed(kind) => kind,
            OtpIssueDecision::Denied(denial) => {
                tracing::debug!(account_id = %account_id, "OTP issuance denied: {:?}", denial);
                audit_logger::report(
                    self.audit_logger.log_otp_throttled(ctx, denial).await,
                    "otp_throttled",
                );
                return Ok(OtpIssueResult::Denied(denial));
            }
        };

        let code = self.crypto_provider.generate_otp_code();
        let digest = self.crypto_provider.otp_digest(&code)?;
        security.otp.record_issue(digest, kind, now);

        self.store.save_otp_state(conn, account_id, &security.otp, now).await?;
        self.delivery.deliver(&model.username, &code)?;

        let sends_today = security.otp.sends_on(now.date_naive());
        audit_logger::report(
            self.audit_logger.log_otp_sent(ctx, kind, sends_today).await,
            "otp_sent",
        );

        let expires_at = security
            .otp
            .expires
            .ok_or_else(|| InternalError::parse("otp_expires", "missing after issue"))?;

        Ok(OtpIssueResult::Issued {
            kind,
            expires_at,
            sends_remaining_today: MAX_OTP_SENDS_PER_DAY.saturating_sub(sends_today),
        })
    }

    /// Check a submitted code and persist the resulting state
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        account_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpVerifyOutcome, InternalError> {
        let model = self.store.get_by_id(conn, account_id).await?;
        let mut security = security_from_model(&model)?;
        let before = security.otp.clone();

        let outcome = security
            .otp
            .verify(now, |digest| self.crypto_provider.otp_matches(code, digest));

        if security.otp != before {
            self.store.save_otp_state(conn, account_id, &security.otp, now).await?;
        }

        audit_logger::report(
            self.audit_logger.log_otp_verification(ctx, outcome).await,
            "otp_verification",
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::stores::AuditStore;
    use crate::stores::account_store::NewAccount;
    use crate::test::utils::{CapturingOtpDelivery, setup_test_audit_db, setup_test_db, test_secret_manager};
    use crate::types::internal::account_security::{
        MAX_OTP_ATTEMPTS, MAX_OTP_RESENDS_PER_DAY, OTP_LENGTH, OTP_TTL_SECS,
    };
    use chrono::{TimeDelta, TimeZone};
    use sea_orm::DatabaseConnection;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    struct Fixture {
        provider: OtpProvider,
        delivery: Arc<CapturingOtpDelivery>,
        db: DatabaseConnection,
        account_id: String,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        let store = Arc::new(AccountStore::new());
        let account = store
            .create_account(
                &db,
                NewAccount {
                    username: "spinner".to_string(),
                    password_hash: "hash".to_string(),
                    role: Role::Artisan,
                },
                now(),
            )
            .await
            .unwrap();

        let delivery = Arc::new(CapturingOtpDelivery::default());
        let provider = OtpProvider::new(
            store,
            Arc::new(CryptoProvider::new(test_secret_manager())),
            delivery.clone(),
            Arc::new(AuditLogger::new(Arc::new(AuditStore::new(setup_test_audit_db().await)))),
        );

        Fixture {
            provider,
            delivery,
            db,
            account_id: account.id,
        }
    }

    #[tokio::test]
    async fn test_issue_delivers_code_and_stores_digest() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");

        let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();

        assert_eq!(
            result,
            OtpIssueResult::Issued {
                kind: OtpIssueKind::Send,
                expires_at: now() + TimeDelta::seconds(OTP_TTL_SECS),
                sends_remaining_today: MAX_OTP_SENDS_PER_DAY - 1,
            }
        );

        let (recipient, code) = f.delivery.last().unwrap();
        assert_eq!(recipient, "spinner");
        assert_eq!(code.len(), OTP_LENGTH);

        let model = AccountStore::new().get_by_id(&f.db, &f.account_id).await.unwrap();
        let stored = model.otp_code.unwrap();
        assert_ne!(stored, code);
    }

    #[tokio::test]
    async fn test_daily_send_cap() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");

        for _ in 0..MAX_OTP_SENDS_PER_DAY {
            let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
            assert!(matches!(result, OtpIssueResult::Issued { .. }));
        }

        let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
        assert_eq!(result, OtpIssueResult::Denied(OtpDenial::DailySendLimit));

        // Next UTC day starts a fresh budget
        let tomorrow = now() + TimeDelta::days(1);
        let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, tomorrow).await.unwrap();
        assert!(matches!(result, OtpIssueResult::Issued { .. }));
    }

    #[tokio::test]
    async fn test_resend_cap() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");

        f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
        for _ in 0..MAX_OTP_RESENDS_PER_DAY {
            let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Resend, now()).await.unwrap();
            assert!(matches!(result, OtpIssueResult::Issued { kind: OtpIssueKind::Resend, .. }));
        }

        let result = f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Resend, now()).await.unwrap();
        assert_eq!(result, OtpIssueResult::Denied(OtpDenial::DailyResendLimit));
    }

    #[tokio::test]
    async fn test_verify_correct_code_clears_it() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");
        f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
        let (_, code) = f.delivery.last().unwrap();

        let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, &code, now()).await.unwrap();
        assert_eq!(outcome, OtpVerifyOutcome::Verified);

        let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, &code, now()).await.unwrap();
        assert_eq!(outcome, OtpVerifyOutcome::NoActiveCode);
    }

    #[tokio::test]
    async fn test_wrong_codes_exhaust_otp() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");
        f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
        let (_, code) = f.delivery.last().unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for attempt in 1..MAX_OTP_ATTEMPTS {
            let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, wrong, now()).await.unwrap();
            assert_eq!(
                outcome,
                OtpVerifyOutcome::Mismatch {
                    remaining_attempts: MAX_OTP_ATTEMPTS - attempt
                }
            );
        }

        let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, wrong, now()).await.unwrap();
        assert_eq!(outcome, OtpVerifyOutcome::Exhausted);

        // The right code no longer works either
        let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, &code, now()).await.unwrap();
        assert_eq!(outcome, OtpVerifyOutcome::NoActiveCode);
    }

    #[tokio::test]
    async fn test_expired_code() {
        let f = setup().await;
        let ctx = RequestContext::for_system("test");
        f.provider.issue(&ctx, &f.db, &f.account_id, OtpIssueKind::Send, now()).await.unwrap();
        let (_, code) = f.delivery.last().unwrap();

        let later = now() + TimeDelta::seconds(OTP_TTL_SECS);
        let outcome = f.provider.verify(&ctx, &f.db, &f.account_id, &code, later).await.unwrap();

        assert_eq!(outcome, OtpVerifyOutcome::Expired);
    }
}
