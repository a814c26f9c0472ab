use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::{BearerAuth, helpers};
use crate::app_data::AppData;
use crate::coordinators::AccessCoordinator;
use crate::errors::AccessError;
use crate::policy::{Action, Resource, Scope};
use crate::providers::TokenProvider;
use crate::types::dto::access::{AccessCheckResponse, RequirementCheckResponse};

/// Policy lookups for the authenticated caller
pub struct AccessApi {
    access_coordinator: AccessCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AccessApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.providers.token_provider.clone(),
            access_coordinator: AccessCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum AccessTags {
    /// Permission and requirement checks
    Access,
}

#[OpenApi(prefix_path = "/access")]
impl AccessApi {
    /// Whether the caller's role may perform `action` on `resource` at `scope`
    ///
    /// `scope` defaults to `own`.
    #[oai(path = "/check", method = "get", tag = "AccessTags::Access")]
    async fn check(
        &self,
        req: &Request,
        auth: BearerAuth,
        resource: Query<String>,
        action: Query<String>,
        scope: Query<Option<String>>,
    ) -> Result<Json<AccessCheckResponse>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        let resource = resource
            .0
            .parse::<Resource>()
            .map_err(|e| AccessError::invalid_request(e.to_string()))?;
        let action = action
            .0
            .parse::<Action>()
            .map_err(|e| AccessError::invalid_request(e.to_string()))?;
        let scope = match scope.0 {
            Some(tag) => tag.parse::<Scope>().map_err(|e| AccessError::invalid_request(e.to_string()))?,
            None => Scope::default(),
        };

        let check = self
            .access_coordinator
            .check(&ctx, resource, action, scope)
            .map_err(AccessError::from_internal_error)?;

        Ok(Json(AccessCheckResponse {
            role: ctx.role().map(|role| role.to_string()).unwrap_or_default(),
            resource: resource.to_string(),
            action: action.to_string(),
            scope: scope.to_string(),
            allowed: check.allowed,
            required_scope: check.required_scope.map(|scope| scope.to_string()),
        }))
    }

    /// Evaluate the caller's requirement bucket for a category
    ///
    /// Categories without a bucket (including unknown ones) are valid.
    #[oai(path = "/requirements/:category", method = "get", tag = "AccessTags::Access")]
    async fn requirements(
        &self,
        req: &Request,
        auth: BearerAuth,
        category: Path<String>,
    ) -> Result<Json<RequirementCheckResponse>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        let check = self
            .access_coordinator
            .requirements(&ctx, &category.0)
            .await
            .map_err(AccessError::from_internal_error)?;

        Ok(Json(RequirementCheckResponse::new(category.0, &check)))
    }
}
