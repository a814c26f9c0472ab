use std::sync::Arc;

use poem::Request;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::{BearerAuth, helpers};
use crate::app_data::AppData;
use crate::coordinators::{AuthCoordinator, LoginResult, OtpCoordinator};
use crate::errors::AuthError;
use crate::providers::{OtpIssueResult, TokenProvider};
use crate::types::dto::auth::{
    LoginRequest, OtpIssuedResponse, OtpVerifyRequest, RegisterRequest, RegisterResponse, TokenResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::internal::account_security::{OtpIssueKind, OtpVerifyOutcome};
use crate::types::internal::context::RequestContext;

/// Registration, login and one-time password endpoints
pub struct AuthApi {
    auth_coordinator: AuthCoordinator,
    otp_coordinator: OtpCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AuthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.providers.token_provider.clone(),
            auth_coordinator: AuthCoordinator::new(app_data.clone()),
            otp_coordinator: OtpCoordinator::new(app_data),
        }
    }

    async fn issue_otp(&self, req: &Request, auth: BearerAuth, kind: OtpIssueKind) -> Result<Json<OtpIssuedResponse>, AuthError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AuthError::from_internal_error)?;

        match self
            .otp_coordinator
            .issue(&ctx, kind)
            .await
            .map_err(AuthError::from_internal_error)?
        {
            OtpIssueResult::Issued {
                kind,
                expires_at,
                sends_remaining_today,
            } => Ok(Json(OtpIssuedResponse {
                kind: kind.as_str().to_string(),
                expires_at: expires_at.to_rfc3339(),
                sends_remaining_today,
            })),
            OtpIssueResult::Denied(denial) => Err(AuthError::otp_limit_reached(denial.message())),
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
    /// One-time password endpoints
    Otp,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Register a customer, artisan or distributor account
    #[oai(path = "/register", method = "post", tag = "AuthTags::Authentication")]
    async fn register(&self, req: &Request, body: Json<RegisterRequest>) -> Result<Json<RegisterResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);

        let account = self
            .auth_coordinator
            .register(&ctx, &body.username, &body.password, &body.role)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(RegisterResponse {
            account_id: account.id,
            username: account.username,
            role: account.role,
        }))
    }

    /// Login with username and password to receive an access token
    ///
    /// A locked account answers 423 even when the password is correct.
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, req: &Request, body: Json<LoginRequest>) -> Result<Json<TokenResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);

        match self
            .auth_coordinator
            .login(&ctx, &body.username, &body.password)
            .await
            .map_err(AuthError::from_internal_error)?
        {
            LoginResult::Success { token, .. } => Ok(Json(TokenResponse {
                access_token: token.token,
                token_type: "Bearer".to_string(),
                expires_in: self.token_provider.expires_in_seconds(),
            })),
            LoginResult::InvalidCredentials => Err(AuthError::invalid_credentials()),
            LoginResult::Locked { lock_until } => Err(AuthError::account_locked(lock_until)),
        }
    }

    /// Send a one-time password to the caller
    #[oai(path = "/otp/send", method = "post", tag = "AuthTags::Otp")]
    async fn otp_send(&self, req: &Request, auth: BearerAuth) -> Result<Json<OtpIssuedResponse>, AuthError> {
        self.issue_otp(req, auth, OtpIssueKind::Send).await
    }

    /// Resend the caller's outstanding one-time password as a fresh code
    #[oai(path = "/otp/resend", method = "post", tag = "AuthTags::Otp")]
    async fn otp_resend(&self, req: &Request, auth: BearerAuth) -> Result<Json<OtpIssuedResponse>, AuthError> {
        self.issue_otp(req, auth, OtpIssueKind::Resend).await
    }

    /// Verify the caller's one-time password
    #[oai(path = "/otp/verify", method = "post", tag = "AuthTags::Otp")]
    async fn otp_verify(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<OtpVerifyRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = helpers::authenticate(&self.token_provider, req, &auth)
            .await
            .map_err(AuthError::from_internal_error)?;

        let outcome = self
            .otp_coordinator
            .verify(&ctx, &body.code)
            .await
            .map_err(AuthError::from_internal_error)?;

        match outcome {
            OtpVerifyOutcome::Verified => Ok(Json(MessageResponse::new("Code verified"))),
            OtpVerifyOutcome::Mismatch { remaining_attempts } => Err(AuthError::otp_rejected(format!(
                "Invalid code. {} attempts remaining",
                remaining_attempts
            ))),
            OtpVerifyOutcome::Exhausted => Err(AuthError::otp_rejected(
                "Too many incorrect attempts. Request a new code",
            )),
            OtpVerifyOutcome::Expired => Err(AuthError::otp_rejected("Code has expired. Request a new code")),
            OtpVerifyOutcome::NoActiveCode => Err(AuthError::otp_rejected("No active code. Request a new code")),
        }
    }
}
