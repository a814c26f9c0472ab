// API layer - HTTP endpoints
pub mod access;
pub mod account;
pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod rate_limit;

use std::sync::Arc;

use poem::{EndpointExt, IntoEndpoint, Route};
use poem_openapi::{OpenApiService, SecurityScheme, auth::Bearer};

pub use access::AccessApi;
pub use account::AccountApi;
pub use admin::AdminApi;
pub use auth::AuthApi;
pub use health::HealthApi;
pub use rate_limit::{RateLimitMiddleware, RateLimiter};

use crate::app_data::AppData;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// Compose the OpenAPI service under `/api` and Swagger UI under `/swagger`
///
/// The per-role rate limit wraps every `/api` route.
pub fn build_routes(app_data: Arc<AppData>, server_url: &str) -> Route {
    let api_service = OpenApiService::new(
        (
            HealthApi,
            AuthApi::new(app_data.clone()),
            AccessApi::new(app_data.clone()),
            AccountApi::new(app_data.clone()),
            AdminApi::new(app_data.clone()),
        ),
        "RootsReach Access API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(server_url);

    let ui = api_service.swagger_ui();
    let rate_limit = RateLimitMiddleware::new(app_data, Arc::new(RateLimiter::new()));

    Route::new()
        .nest("/api", api_service.into_endpoint().with(rate_limit))
        .nest("/swagger", ui)
}
