use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::policy::{Action, RequirementCheck, Resource, Scope};
use crate::providers::{AccessCheck, AuthorizationProvider};
use crate::types::internal::context::RequestContext;

/// Answers policy questions for the authenticated caller
pub struct AccessCoordinator {
    db: DatabaseConnection,
    authorization_provider: Arc<AuthorizationProvider>,
}

impl AccessCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            authorization_provider: app_data.providers.authorization_provider.clone(),
        }
    }

    /// Permission lookup for the caller's role
    pub fn check(
        &self,
        ctx: &RequestContext,
        resource: Resource,
        action: Action,
        scope: Scope,
    ) -> Result<AccessCheck, InternalError> {
        let role = ctx
            .role()
            .ok_or_else(|| CredentialError::invalid_token("jwt", "missing claims"))?;

        Ok(self.authorization_provider.check(role, resource, action, scope))
    }

    pub async fn requirements(
        &self,
        ctx: &RequestContext,
        category: &str,
    ) -> Result<RequirementCheck, InternalError> {
        self.authorization_provider
            .evaluate_requirements(ctx, &self.db, category)
            .await
    }
}
