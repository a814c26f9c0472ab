// Coordinators layer - Workflow orchestration
//
// Coordinators handle pure workflow orchestration by composing provider operations
// for specific API endpoints and CLI commands. They own transaction boundaries
// and determine the sequence of operations without containing business logic.

use crate::policy::{Action, Resource, Scope};

pub mod access_coordinator;
pub mod account_coordinator;
pub mod admin_coordinator;
pub mod auth_coordinator;
pub mod otp_coordinator;

pub use access_coordinator::AccessCoordinator;
pub use account_coordinator::AccountCoordinator;
pub use admin_coordinator::AdminCoordinator;
pub use auth_coordinator::{AuthCoordinator, LoginResult};
pub use otp_coordinator::OtpCoordinator;

/// Result of a permission-gated operation
///
/// A denial is an expected outcome carrying the permission that was missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorized<T> {
    Granted(T),
    Denied {
        resource: Resource,
        action: Action,
        scope: Scope,
    },
}
