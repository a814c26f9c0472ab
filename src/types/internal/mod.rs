// Internal types - never exposed on the wire directly
pub mod account_security;
pub mod audit;
pub mod auth;
pub mod context;

pub use account_security::{AccountSecurity, OtpIssueDecision, OtpIssueKind, OtpState, OtpVerifyOutcome};
pub use context::RequestContext;
