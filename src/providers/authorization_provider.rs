use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::audit::{AuditLogger, audit_logger};
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::policy::{
    AccessPolicy, Action, RateLimit, RequirementCheck, Resource, Role, Scope,
};
use crate::stores::AccountStore;
use crate::types::internal::context::RequestContext;

/// Answer to "may this role do this", with the scope the row grants for the action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCheck {
    pub allowed: bool,
    pub required_scope: Option<Scope>,
}

/// Applies the access policy to authenticated callers
pub struct AuthorizationProvider {
    policy: &'static AccessPolicy,
    store: Arc<AccountStore>,
    audit_logger: Arc<AuditLogger>,
}

impl AuthorizationProvider {
    pub fn new(policy: &'static AccessPolicy, store: Arc<AccountStore>, audit_logger: Arc<AuditLogger>) -> Self {
        Self {
            policy,
            store,
            audit_logger,
        }
    }

    pub fn policy(&self) -> &'static AccessPolicy {
        self.policy
    }

    /// Pure lookup, no audit trail
    pub fn check(&self, role: Role, resource: Resource, action: Action, scope: Scope) -> AccessCheck {
        AccessCheck {
            allowed: self.policy.has_permission(role, resource, action, scope),
            required_scope: self.policy.required_permission_level(role, resource, action),
        }
    }

    /// Gate an operation on the caller's role; denials are audited
    ///
    /// Unauthenticated contexts have no role and are always denied.
    pub async fn authorize(&self, ctx: &RequestContext, resource: Resource, action: Action, scope: Scope) -> bool {
        let allowed = ctx
            .role()
            .is_some_and(|role| self.policy.has_permission(role, resource, action, scope));

        if !allowed {
            tracing::debug!(actor = %ctx.actor_id, "Permission denied: {} {} {}", resource, action, scope);
            audit_logger::report(
                self.audit_logger.log_permission_denied(ctx, resource, action, scope).await,
                "permission_denied",
            );
        }

        allowed
    }

    /// Evaluate the caller's requirement bucket for `category` against their stored account
    ///
    /// `category` is the wire tag; unknown tags have no bucket and pass.
    pub async fn evaluate_requirements(
        &self,
        ctx: &RequestContext,
        conn: &impl ConnectionTrait,
        category: &str,
    ) -> Result<RequirementCheck, InternalError> {
        let (Some(role), Some(account_id)) = (ctx.role(), ctx.account_id()) else {
            return Err(CredentialError::invalid_token("jwt", "missing claims").into());
        };

        let snapshot = self.store.snapshot(conn, account_id).await?;
        let check = self.policy.check_requirements_for(role, category, &snapshot);

        if let Some(code) = check.code() {
            audit_logger::report(
                self.audit_logger.log_requirement_not_met(ctx, category, code).await,
                "requirement_not_met",
            );
        }

        Ok(check)
    }

    /// Request budget for a caller; anonymous callers get the customer budget
    pub fn rate_limit(&self, role: Option<Role>) -> RateLimit {
        self.policy.rate_limit(role.unwrap_or(Role::Customer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RequirementFailureCode;
    use crate::stores::AuditStore;
    use crate::stores::account_store::{NewAccount, NewAddress};
    use crate::test::utils::{setup_test_audit_db, setup_test_db};
    use crate::types::internal::auth::Claims;
    use chrono::Utc;

    async fn provider() -> (AuthorizationProvider, Arc<AuditStore>) {
        let audit_store = Arc::new(AuditStore::new(setup_test_audit_db().await));
        let provider = AuthorizationProvider::new(
            AccessPolicy::global(),
            Arc::new(AccountStore::new()),
            Arc::new(AuditLogger::new(audit_store.clone())),
        );
        (provider, audit_store)
    }

    fn ctx_for(account_id: &str, role: Role) -> RequestContext {
        RequestContext::for_system("test").with_auth(Claims {
            sub: account_id.to_string(),
            role,
            exp: 2_000_000_000,
            iat: 1_999_999_100,
            jti: "jti".to_string(),
        })
    }

    #[tokio::test]
    async fn test_check_reports_required_scope() {
        let (provider, _) = provider().await;

        // read:all on the row covers a request at own scope
        let check = provider.check(Role::Distributor, Resource::Product, Action::Read, Scope::Own);
        assert_eq!(
            check,
            AccessCheck {
                allowed: true,
                required_scope: Some(Scope::All)
            }
        );

        let check = provider.check(Role::Distributor, Resource::Product, Action::Update, Scope::All);
        assert_eq!(
            check,
            AccessCheck {
                allowed: false,
                required_scope: Some(Scope::Own)
            }
        );

        let check = provider.check(Role::Distributor, Resource::Product, Action::Delete, Scope::Own);
        assert_eq!(
            check,
            AccessCheck {
                allowed: false,
                required_scope: None
            }
        );

        let check = provider.check(Role::Customer, Resource::Inventory, Action::Read, Scope::Own);
        assert_eq!(check.required_scope, None);
    }

    #[tokio::test]
    async fn test_authorize_audits_denial() {
        let (provider, audit_store) = provider().await;
        let ctx = ctx_for("acc-1", Role::Customer);

        assert!(provider.authorize(&ctx, Resource::Address, Action::Create, Scope::Own).await);
        assert!(!provider.authorize(&ctx, Resource::User, Action::Update, Scope::All).await);

        assert_eq!(audit_store.events_of_type("permission_denied").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_is_denied() {
        let (provider, _) = provider().await;
        let ctx = RequestContext::for_system("test");

        assert!(!provider.authorize(&ctx, Resource::Product, Action::Read, Scope::Public).await);
    }

    #[tokio::test]
    async fn test_requirements_use_stored_account() {
        let (provider, _) = provider().await;
        let db = setup_test_db().await;
        let store = AccountStore::new();
        let account = store
            .create_account(
                &db,
                NewAccount {
                    username: "hauler".to_string(),
                    password_hash: "hash".to_string(),
                    role: Role::Distributor,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let ctx = ctx_for(&account.id, Role::Distributor);

        let check = provider
            .evaluate_requirements(&ctx, &db, "inventoryOperations")
            .await
            .unwrap();
        assert_eq!(check.code(), Some(RequirementFailureCode::IdentityVerificationRequired));

        store.set_identity_verified(&db, &account.id, true, Utc::now()).await.unwrap();
        let check = provider
            .evaluate_requirements(&ctx, &db, "inventoryOperations")
            .await
            .unwrap();
        assert_eq!(check.code(), Some(RequirementFailureCode::AddressRequired));

        store
            .add_address(
                &db,
                &account.id,
                NewAddress {
                    line1: "12 Market Road".to_string(),
                    city: "Kumasi".to_string(),
                    postal_code: "00233".to_string(),
                    country: "GH".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let check = provider
            .evaluate_requirements(&ctx, &db, "inventoryOperations")
            .await
            .unwrap();
        assert!(check.is_valid());
    }

    #[tokio::test]
    async fn test_unknown_category_passes_without_audit() {
        let (provider, audit_store) = provider().await;
        let db = setup_test_db().await;
        let account = AccountStore::new()
            .create_account(
                &db,
                NewAccount {
                    username: "courier".to_string(),
                    password_hash: "hash".to_string(),
                    role: Role::Distributor,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let ctx = ctx_for(&account.id, Role::Distributor);

        let check = provider.evaluate_requirements(&ctx, &db, "payoutSchedule").await.unwrap();
        assert!(check.is_valid());

        // Tags are case-sensitive, so this is not the inventory bucket
        let check = provider
            .evaluate_requirements(&ctx, &db, "InventoryOperations")
            .await
            .unwrap();
        assert!(check.is_valid());

        assert!(audit_store.events_of_type("requirement_not_met").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_rate_limit_uses_customer_row() {
        let (provider, _) = provider().await;

        assert_eq!(provider.rate_limit(None), provider.rate_limit(Some(Role::Customer)));
        assert_eq!(provider.rate_limit(Some(Role::Admin)).max_requests, 1000);
    }
}
