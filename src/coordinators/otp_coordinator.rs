use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::{OtpIssueResult, OtpProvider};
use crate::types::internal::account_security::{OtpIssueKind, OtpVerifyOutcome};
use crate::types::internal::context::RequestContext;

/// Orchestrates OTP issuance and verification for the calling account
///
/// Each workflow runs read-decide-write inside one transaction.
pub struct OtpCoordinator {
    db: DatabaseConnection,
    otp_provider: Arc<OtpProvider>,
}

impl OtpCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            otp_provider: app_data.providers.otp_provider.clone(),
        }
    }

    pub async fn issue(&self, ctx: &RequestContext, kind: OtpIssueKind) -> Result<OtpIssueResult, InternalError> {
        let account_id = caller(ctx)?;

        let txn = begin_transaction(&self.db).await?;
        let result = self.otp_provider.issue(ctx, &txn, account_id, kind, Utc::now()).await?;
        commit_transaction(txn).await?;

        Ok(result)
    }

    pub async fn verify(&self, ctx: &RequestContext, code: &str) -> Result<OtpVerifyOutcome, InternalError> {
        let account_id = caller(ctx)?;

        let txn = begin_transaction(&self.db).await?;
        let outcome = self.otp_provider.verify(ctx, &txn, account_id, code, Utc::now()).await?;
        commit_transaction(txn).await?;

        Ok(outcome)
    }
}

fn caller(ctx: &RequestContext) -> Result<&str, InternalError> {
    ctx.account_id()
        .ok_or_else(|| CredentialError::invalid_token("jwt", "missing claims").into())
}
