use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::app_data::AppData;
use crate::audit::{AuditLogger, audit_logger};
use crate::coordinators::Authorized;
use crate::errors::InternalError;
use crate::policy::{Action, Resource, Role, Scope};
use crate::providers::{AuthenticationProvider, AuthorizationProvider};
use crate::stores::AccountStore;
use crate::stores::account_store::{role_from_model, security_from_model};
use crate::types::db::account;
use crate::types::internal::account_security::AccountSecurity;
use crate::types::internal::context::RequestContext;

/// Account as an administrator sees it
#[derive(Debug, Clone)]
pub struct AccountOverview {
    pub account: account::Model,
    pub role: Role,
    pub security: AccountSecurity,
    pub address_count: u64,
}

/// Administrative account management
///
/// API workflows are gated on `user:*:all`. The CLI workflows (`create_admin`,
/// `unlock_username`) run with operator trust and are not gated.
pub struct AdminCoordinator {
    db: DatabaseConnection,
    account_store: Arc<AccountStore>,
    authentication_provider: Arc<AuthenticationProvider>,
    authorization_provider: Arc<AuthorizationProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl AdminCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            account_store: app_data.account_store.clone(),
            authentication_provider: app_data.providers.authentication_provider.clone(),
            authorization_provider: app_data.providers.authorization_provider.clone(),
            audit_logger: app_data.audit_logger.clone(),
        }
    }

    /// `Some(Denied)` when the caller lacks `user:<action>:all`
    async fn gate<T>(&self, ctx: &RequestContext, action: Action) -> Option<Authorized<T>> {
        let (resource, scope) = (Resource::User, Scope::All);
        if self.authorization_provider.authorize(ctx, resource, action, scope).await {
            None
        } else {
            Some(Authorized::Denied { resource, action, scope })
        }
    }

    async fn overview(&self, conn: &impl ConnectionTrait, account_id: &str) -> Result<AccountOverview, InternalError> {
        let account = self.account_store.get_by_id(conn, account_id).await?;
        let address_count = self.account_store.count_addresses(conn, account_id).await?;

        Ok(AccountOverview {
            role: role_from_model(&account)?,
            security: security_from_model(&account)?,
            account,
            address_count,
        })
    }

    pub async fn get_account(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> Result<Authorized<AccountOverview>, InternalError> {
        if let Some(denied) = self.gate(ctx, Action::Read).await {
            return Ok(denied);
        }

        Ok(Authorized::Granted(self.overview(&self.db, account_id).await?))
    }

    /// Record the outcome of an out-of-band identity check
    pub async fn set_identity_verified(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        verified: bool,
    ) -> Result<Authorized<AccountOverview>, InternalError> {
        if let Some(denied) = self.gate(ctx, Action::Update).await {
            return Ok(denied);
        }

        self.account_store
            .set_identity_verified(&self.db, account_id, verified, Utc::now())
            .await?;

        tracing::info!(account_id = %account_id, verified, "Identity verification updated");
        audit_logger::report(
            self.audit_logger.log_identity_verified(ctx, account_id, verified).await,
            "identity_verified",
        );

        Ok(Authorized::Granted(self.overview(&self.db, account_id).await?))
    }

    pub async fn unlock(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> Result<Authorized<AccountOverview>, InternalError> {
        if let Some(denied) = self.gate(ctx, Action::Update).await {
            return Ok(denied);
        }

        self.authentication_provider
            .unlock(ctx, &self.db, account_id, Utc::now())
            .await?;

        Ok(Authorized::Granted(self.overview(&self.db, account_id).await?))
    }

    /// Create an administrator account from the CLI
    pub async fn create_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<account::Model, InternalError> {
        self.authentication_provider
            .create_account(ctx, &self.db, username, password, Role::Admin, Utc::now())
            .await
    }

    /// Unlock an account by username from the CLI; returns the account id
    pub async fn unlock_username(&self, ctx: &RequestContext, username: &str) -> Result<String, InternalError> {
        let account = self.account_store.get_by_username(&self.db, username).await?;

        self.authentication_provider
            .unlock(ctx, &self.db, &account.id, Utc::now())
            .await?;

        Ok(account.id)
    }
}
