use poem::Request;

use crate::api::BearerAuth;
use crate::errors::InternalError;
use crate::providers::TokenProvider;
use crate::types::internal::context::RequestContext;

/// Build the RequestContext for a bearer-authenticated endpoint
///
/// The JWT is validated (and failures audited) before any handler logic runs.
pub async fn authenticate(
    token_provider: &TokenProvider,
    req: &Request,
    auth: &BearerAuth,
) -> Result<RequestContext, InternalError> {
    let ctx = RequestContext::from_request(req);
    let claims = token_provider.validate_jwt(&ctx, &auth.0.token).await?;

    Ok(ctx.with_auth(claims))
}
