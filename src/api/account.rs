use std::sync::Arc;

use chrono::DateTime;
use poem::Request;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::{BearerAuth, helpers};
use crate::app_data::AppData;
use crate::coordinators::{AccountCoordinator, Authorized};
use crate::errors::AccessError;
use crate::providers::TokenProvider;
use crate::stores::account_store::NewAddress;
use crate::types::dto::account::{AddressRequest, AddressResponse};

/// Self-service endpoints on the caller's own account
pub struct AccountApi {
    account_coordinator: AccountCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AccountApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.providers.token_provider.clone(),
            account_coordinator: AccountCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum AccountTags {
    /// Caller's own account
    Account,
}

#[OpenApi(prefix_path = "/account")]
impl AccountApi {
    /// Add an address to the caller's account
    #[oai(path = "/addresses", method = "post", tag = "AccountTags::Account")]
    async fn add_address(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<AddressRequest>,
    ) -> Result<Json<AddressResponse>, AccessError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AccessError::from_internal_error)?;

        let body = body.0;
        let new_address = NewAddress {
            line1: body.line1,
            city: body.city,
            postal_code: body.postal_code,
            country: body.country,
        };

        match self
            .account_coordinator
            .add_address(&ctx, new_address)
            .await
            .map_err(AccessError::from_internal_error)?
        {
            Authorized::Granted(address) => Ok(Json(AddressResponse {
                created_at: DateTime::from_timestamp(address.created_at, 0)
                    .map(|created| created.to_rfc3339())
                    .unwrap_or_default(),
                id: address.id,
                line1: address.line1,
                city: address.city,
                postal_code: address.postal_code,
                country: address.country,
            })),
            Authorized::Denied { resource, action, scope } => {
                Err(AccessError::permission_denied(resource, action, scope))
            }
        }
    }
}
