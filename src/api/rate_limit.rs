use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use poem::http::StatusCode;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};

use crate::app_data::AppData;
use crate::audit::{AuditLogger, audit_logger};
use crate::policy::{RateLimit, Role};
use crate::providers::{AuthorizationProvider, TokenProvider};
use crate::types::internal::context::RequestContext;

/// Windows kept before expired ones are swept
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Default)]
struct LimiterState {
    windows: HashMap<String, Window>,
    last_sweep: Option<Instant>,
}

/// Fixed-window request counter keyed by caller
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    prune_threshold: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_prune_threshold(PRUNE_THRESHOLD)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prune_threshold(prune_threshold: usize) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            prune_threshold,
        }
    }

    /// Number of callers currently holding a window
    pub fn tracked_keys(&self) -> usize {
        self.state.lock().windows.len()
    }

    /// Count one request for `key` against `limit`
    ///
    /// A window opens on the first request and lasts `limit.window`; refused
    /// requests are not counted. Expired windows are swept once the key count
    /// reaches the prune threshold, at most once per window.
    pub fn check(&self, key: &str, limit: RateLimit, now: Instant) -> RateDecision {
        let mut state = self.state.lock();

        let sweep_due = state
            .last_sweep
            .is_none_or(|last| now.duration_since(last) >= limit.window);
        if state.windows.len() >= self.prune_threshold && sweep_due {
            state
                .windows
                .retain(|_, window| now.duration_since(window.started) < limit.window);
            state.last_sweep = Some(now);
        }

        let window = state
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });
        let elapsed = now.duration_since(window.started);
        if elapsed >= limit.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= limit.max_requests {
            return RateDecision::Limited {
                retry_after: limit.window.saturating_sub(now.duration_since(window.started)),
            };
        }

        window.count += 1;
        RateDecision::Allowed {
            remaining: limit.max_requests - window.count,
        }
    }
}

/// Applies the per-role request budget
///
/// Callers with a valid bearer token are keyed by token subject and use their
/// role's budget; everyone else is keyed by client IP on the customer budget.
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
    token_provider: Arc<TokenProvider>,
    authorization_provider: Arc<AuthorizationProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl RateLimitMiddleware {
    pub fn new(app_data: Arc<AppData>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            token_provider: app_data.providers.token_provider.clone(),
            authorization_provider: app_data.providers.authorization_provider.clone(),
            audit_logger: app_data.audit_logger.clone(),
        }
    }
}

impl<E: Endpoint> Middleware<E> for RateLimitMiddleware {
    type Output = RateLimitEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RateLimitEndpoint {
            inner: ep,
            limiter: self.limiter.clone(),
            token_provider: self.token_provider.clone(),
            authorization_provider: self.authorization_provider.clone(),
            audit_logger: self.audit_logger.clone(),
        }
    }
}

pub struct RateLimitEndpoint<E> {
    inner: E,
    limiter: Arc<RateLimiter>,
    token_provider: Arc<TokenProvider>,
    authorization_provider: Arc<AuthorizationProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl<E: Endpoint> Endpoint for RateLimitEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let ctx = RequestContext::from_request(&req);
        let claims = bearer_token(&req).and_then(|token| self.token_provider.peek_claims(token));

        let role = claims.as_ref().map(|claims| claims.role);
        let key = match &claims {
            Some(claims) => format!("sub:{}", claims.sub),
            None => format!("ip:{}", ctx.ip_string().unwrap_or_else(|| "unknown".to_string())),
        };
        let limit = self.authorization_provider.rate_limit(role);

        match self.limiter.check(&key, limit, Instant::now()) {
            RateDecision::Allowed { .. } => {
                let response = self.inner.call(req).await?;
                Ok(response.into_response())
            }
            RateDecision::Limited { retry_after } => {
                tracing::warn!(key = %key, "Rate limit exceeded");

                let ctx = match claims {
                    Some(claims) => ctx.with_auth(claims),
                    None => ctx,
                };
                audit_logger::report(
                    self.audit_logger
                        .log_rate_limited(&ctx, role.unwrap_or(Role::Customer), limit.max_requests)
                        .await,
                    "rate_limited",
                );

                Ok(too_many_requests(retry_after))
            }
        }
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.header("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn too_many_requests(retry_after: Duration) -> Response {
    let body = serde_json::json!({
        "error": "rate_limited",
        "message": "Too many requests. Try again later",
        "status_code": 429,
    });

    Response::builder()
        .status(StatusCode::TOO_MANY_REQUESTS)
        .header("Retry-After", retry_after.as_secs().max(1).to_string())
        .content_type("application/json")
        .body(body.to_string())
}
