use std::sync::Arc;

use chrono::Utc;
use poem::Request;
use poem_openapi::param::Path;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::{BearerAuth, helpers};
use crate::app_data::AppData;
use crate::coordinators::Authorized;
use crate::coordinators::admin_coordinator::{AccountOverview, AdminCoordinator};
use crate::errors::AccessError;
use crate::providers::TokenProvider;
use crate::types::dto::account::{AccountSummary, IdentityVerificationRequest};

/// Administrative account management endpoints
pub struct AdminApi {
    admin_coordinator: AdminCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AdminApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.providers.token_provider.clone(),
            admin_coordinator: AdminCoordinator::new(app_data),
        }
    }
}

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// Account administration
    Admin,
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// Account overview including lockout state
    #[oai(path = "/accounts/:id", method = "get", tag = "AdminTags::Admin")]
    async fn get_account(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<String>,
    ) -> Result<Json<AccountSummary>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        summary_response(
            self.admin_coordinator
                .get_account(&ctx, &id.0)
                .await
                .map_err(AccessError::from_internal_error)?,
        )
    }

    /// Record the outcome of an identity check
    #[oai(path = "/accounts/:id/verify-identity", method = "post", tag = "AdminTags::Admin")]
    async fn verify_identity(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<String>,
        body: Json<IdentityVerificationRequest>,
    ) -> Result<Json<AccountSummary>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        summary_response(
            self.admin_coordinator
                .set_identity_verified(&ctx, &id.0, body.verified)
                .await
                .map_err(AccessError::from_internal_error)?,
        )
    }

    /// Clear failed-login attempts and any lock
    #[oai(path = "/accounts/:id/unlock", method = "post", tag = "AdminTags::Admin")]
    async fn unlock(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<String>,
    ) -> Result<Json<AccountSummary>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        summary_response(
            self.admin_coordinator
                .unlock(&ctx, &id.0)
                .await
                .map_err(AccessError::from_internal_error)?,
        )
    }
}

fn summary_response(result: Authorized<AccountOverview>) -> Result<Json<AccountSummary>, AccessError> {
    match result {
        Authorized::Granted(overview) => Ok(Json(summary(overview))),
        Authorized::Denied { resource, action, scope } => Err(AccessError::permission_denied(resource, action, scope)),
    }
}

fn summary(overview: AccountOverview) -> AccountSummary {
    AccountSummary {
        locked: overview.security.is_locked(Utc::now()),
        lock_until: overview.security.lock_until.map(|until| until.to_rfc3339()),
        login_attempts: overview.security.login_attempts,
        account_id: overview.account.id,
        username: overview.account.username,
        role: overview.role.to_string(),
        is_identity_verified: overview.account.is_identity_verified,
        address_count: overview.address_count,
    }
}
