// Providers layer - Work performers and business logic
//
// Providers contain business logic and provide composable operations that
// coordinators can orchestrate. They take the connection or transaction to
// run on and never decide transaction boundaries themselves.

pub mod authentication_provider;
pub mod authorization_provider;
pub mod crypto_provider;
pub mod otp_provider;
pub mod password_validator_provider;
pub mod token_provider;

pub use authentication_provider::{AuthenticationProvider, LoginOutcome};
pub use authorization_provider::{AccessCheck, AuthorizationProvider};
pub use crypto_provider::CryptoProvider;
pub use otp_provider::{LogOtpDelivery, OtpDelivery, OtpIssueResult, OtpProvider};
pub use password_validator_provider::{PasswordValidationError, PasswordValidatorProvider};
pub use token_provider::{IssuedToken, TokenProvider};
