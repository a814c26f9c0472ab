use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::UnknownTag;

/// Precondition on the caller's own account, checked on top of role permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    IdentityVerified,
    CompleteAddress,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityVerified => "identity_verified",
            Self::CompleteAddress => "complete_address",
        }
    }

    /// Evaluate against a snapshot; `None` means satisfied
    fn evaluate(&self, account: &AccountSnapshot) -> Option<RequirementFailure> {
        match self {
            Self::IdentityVerified if !account.is_identity_verified => {
                Some(RequirementFailure::identity_verification_required())
            }
            Self::CompleteAddress if account.address_count == 0 => {
                Some(RequirementFailure::address_required())
            }
            _ => None,
        }
    }
}

/// Bucket of operations a requirement list is attached to.
/// Wire tags are the camelCase names used by the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementCategory {
    ProductOperations,
    BankDetailsUpdate,
    InventoryOperations,
    OrderOperations,
}

impl RequirementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductOperations => "productOperations",
            Self::BankDetailsUpdate => "bankDetailsUpdate",
            Self::InventoryOperations => "inventoryOperations",
            Self::OrderOperations => "orderOperations",
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementCategory {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "productOperations" => Ok(Self::ProductOperations),
            "bankDetailsUpdate" => Ok(Self::BankDetailsUpdate),
            "inventoryOperations" => Ok(Self::InventoryOperations),
            "orderOperations" => Ok(Self::OrderOperations),
            other => Err(UnknownTag {
                kind: "requirement category",
                value: other.to_string(),
            }),
        }
    }
}

/// The parts of a caller's account that requirements are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub is_identity_verified: bool,
    pub address_count: u64,
}

/// Stable failure codes surfaced to clients for remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementFailureCode {
    IdentityVerificationRequired,
    AddressRequired,
}

impl RequirementFailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityVerificationRequired => "IDENTITY_VERIFICATION_REQUIRED",
            Self::AddressRequired => "ADDRESS_REQUIRED",
        }
    }
}

impl fmt::Display for RequirementFailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementFailure {
    pub code: RequirementFailureCode,
    pub message: String,
}

impl RequirementFailure {
    pub fn identity_verification_required() -> Self {
        Self {
            code: RequirementFailureCode::IdentityVerificationRequired,
            message: "Identity verification is required for this operation".to_string(),
        }
    }

    pub fn address_required() -> Self {
        Self {
            code: RequirementFailureCode::AddressRequired,
            message: "A complete address is required for this operation".to_string(),
        }
    }
}

/// Outcome of a requirement check. Only the first failing requirement is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementCheck {
    Valid,
    Failed(RequirementFailure),
}

impl RequirementCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn code(&self) -> Option<RequirementFailureCode> {
        match self {
            Self::Valid => None,
            Self::Failed(failure) => Some(failure.code),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Failed(failure) => Some(&failure.message),
        }
    }

    /// Walk `requirements` in order, stopping at the first failure
    pub fn evaluate(requirements: &[Requirement], account: &AccountSnapshot) -> Self {
        requirements
            .iter()
            .find_map(|requirement| requirement.evaluate(account))
            .map_or(Self::Valid, Self::Failed)
    }
}
