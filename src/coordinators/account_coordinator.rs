use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::audit::{AuditLogger, audit_logger};
use crate::coordinators::Authorized;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::policy::{Action, Resource, Scope};
use crate::providers::AuthorizationProvider;
use crate::stores::AccountStore;
use crate::stores::account_store::NewAddress;
use crate::types::db::address;
use crate::types::internal::context::RequestContext;

/// Self-service operations on the caller's own account
pub struct AccountCoordinator {
    db: DatabaseConnection,
    account_store: Arc<AccountStore>,
    authorization_provider: Arc<AuthorizationProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl AccountCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            account_store: app_data.account_store.clone(),
            authorization_provider: app_data.providers.authorization_provider.clone(),
            audit_logger: app_data.audit_logger.clone(),
        }
    }

    /// Add an address to the caller's account; gated by `address:create:own`
    pub async fn add_address(
        &self,
        ctx: &RequestContext,
        new_address: NewAddress,
    ) -> Result<Authorized<address::Model>, InternalError> {
        let (resource, action, scope) = (Resource::Address, Action::Create, Scope::Own);
        if !self.authorization_provider.authorize(ctx, resource, action, scope).await {
            return Ok(Authorized::Denied { resource, action, scope });
        }

        let account_id = ctx
            .account_id()
            .ok_or_else(|| CredentialError::invalid_token("jwt", "missing claims"))?;

        let address = self
            .account_store
            .add_address(&self.db, account_id, new_address, Utc::now())
            .await?;

        audit_logger::report(
            self.audit_logger.log_address_added(ctx, &address.id).await,
            "address_added",
        );

        Ok(Authorized::Granted(address))
    }
}
