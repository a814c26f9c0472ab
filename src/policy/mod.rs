// Policy layer - static role/resource permission table, account requirements
// and per-role request budgets
pub mod rate_limit;
pub mod requirements;
pub mod table;
pub mod types;

pub use rate_limit::RateLimit;
pub use requirements::{
    AccountSnapshot, Requirement, RequirementCategory, RequirementCheck, RequirementFailure,
    RequirementFailureCode,
};
pub use table::AccessPolicy;
pub use types::{Action, Permission, PermissionSet, Resource, Role, Scope, UnknownTag};
