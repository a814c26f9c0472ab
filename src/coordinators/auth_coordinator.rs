use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::audit::{AuditLogger, audit_logger};
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::policy::Role;
use crate::providers::{AuthenticationProvider, IssuedToken, LoginOutcome, TokenProvider};
use crate::types::db::account;
use crate::types::internal::context::RequestContext;

/// Outcome of a login attempt as seen by the API
#[derive(Debug, Clone)]
pub enum LoginResult {
    Success {
        account_id: String,
        role: Role,
        token: IssuedToken,
    },
    InvalidCredentials,
    Locked {
        lock_until: Option<DateTime<Utc>>,
    },
}

/// Orchestrates registration and login
pub struct AuthCoordinator {
    db: DatabaseConnection,
    authentication_provider: Arc<AuthenticationProvider>,
    token_provider: Arc<TokenProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl AuthCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            authentication_provider: app_data.providers.authentication_provider.clone(),
            token_provider: app_data.providers.token_provider.clone(),
            audit_logger: app_data.audit_logger.clone(),
        }
    }

    pub fn token_provider(&self) -> Arc<TokenProvider> {
        self.token_provider.clone()
    }

    pub async fn register(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<account::Model, InternalError> {
        self.authentication_provider
            .register(ctx, &self.db, username, password, role, Utc::now())
            .await
    }

    /// Login workflow
    ///
    /// 1. Check credentials and apply the lockout transition in one transaction
    /// 2. Commit, so a failed attempt is counted even though the login is refused
    /// 3. On success issue an access token
    pub async fn login(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<LoginResult, InternalError> {
        let txn = begin_transaction(&self.db).await?;
        let outcome = self
            .authentication_provider
            .authenticate(ctx, &txn, username, password, Utc::now())
            .await?;
        commit_transaction(txn).await?;

        match outcome {
            LoginOutcome::InvalidCredentials => Ok(LoginResult::InvalidCredentials),
            LoginOutcome::Locked { lock_until } => Ok(LoginResult::Locked { lock_until }),
            LoginOutcome::Authenticated { account_id, role, .. } => {
                let ctx = ctx.clone().with_actor_id(account_id.clone());
                let token = self.token_provider.generate_jwt(&ctx, &account_id, role).await?;

                audit_logger::report(
                    self.audit_logger.log_login_success(&ctx, &account_id, &token.jwt_id).await,
                    "login_success",
                );

                Ok(LoginResult::Success {
                    account_id,
                    role,
                    token,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_app_data;
    use crate::types::internal::account_security::MAX_LOGIN_ATTEMPTS;

    #[tokio::test]
    async fn test_login_issues_token_for_role() {
        let (app_data, _) = setup_test_app_data().await;
        let coordinator = AuthCoordinator::new(app_data.clone());
        let ctx = RequestContext::for_system("test");

        let created = coordinator.register(&ctx, "dyer", "indigo-vat-2025", "distributor").await.unwrap();
        let result = coordinator.login(&ctx, "dyer", "indigo-vat-2025").await.unwrap();

        let LoginResult::Success { account_id, role, token } = result else {
            panic!("expected successful login");
        };
        assert_eq!(account_id, created.id);
        assert_eq!(role, Role::Distributor);

        let claims = coordinator.token_provider().validate_jwt(&ctx, &token.token).await.unwrap();
        assert_eq!(claims.sub, created.id);
        assert_eq!(app_data.audit_store.events_of_type("login_success").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_attempts_are_committed() {
        let (app_data, _) = setup_test_app_data().await;
        let coordinator = AuthCoordinator::new(app_data.clone());
        let ctx = RequestContext::for_system("test");
        coordinator.register(&ctx, "dyer", "indigo-vat-2025", "customer").await.unwrap();

        for _ in 0..MAX_LOGIN_ATTEMPTS - 1 {
            let result = coordinator.login(&ctx, "dyer", "madder-root").await.unwrap();
            assert!(matches!(result, LoginResult::InvalidCredentials));
        }

        let model = app_data
            .account_store
            .get_by_username(&app_data.connections.auth, "dyer")
            .await
            .unwrap();
        assert_eq!(model.login_attempts, (MAX_LOGIN_ATTEMPTS - 1) as i32);

        let result = coordinator.login(&ctx, "dyer", "madder-root").await.unwrap();
        assert!(matches!(result, LoginResult::Locked { lock_until: Some(_) }));
    }
}
