use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag that failed to parse into one of the closed policy enumerations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownTag {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Account category of the caller. One role per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Artisan,
    Distributor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Customer, Role::Artisan, Role::Distributor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Artisan => "artisan",
            Self::Distributor => "distributor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "artisan" => Ok(Self::Artisan),
            "distributor" => Ok(Self::Distributor),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownTag::new("role", other)),
        }
    }
}

/// Protected entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Artisan,
    Distributor,
    Product,
    Order,
    Inventory,
    Address,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::User,
        Resource::Artisan,
        Resource::Distributor,
        Resource::Product,
        Resource::Order,
        Resource::Inventory,
        Resource::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Artisan => "artisan",
            Self::Distributor => "distributor",
            Self::Product => "product",
            Self::Order => "order",
            Self::Inventory => "inventory",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "artisan" => Ok(Self::Artisan),
            "distributor" => Ok(Self::Distributor),
            "product" => Ok(Self::Product),
            "order" => Ok(Self::Order),
            "inventory" => Ok(Self::Inventory),
            "address" => Ok(Self::Address),
            other => Err(UnknownTag::new("resource", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownTag::new("action", other)),
        }
    }
}

/// Which instances of a resource a permission covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Own,
    Public,
    All,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Own, Scope::Public, Scope::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Public => "public",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "own" => Ok(Self::Own),
            "public" => Ok(Self::Public),
            "all" => Ok(Self::All),
            other => Err(UnknownTag::new("scope", other)),
        }
    }
}

/// One entry of a permission row: `<action>:<scope>` or the `*` wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Grant { action: Action, scope: Scope },
    Wildcard,
}

impl Permission {
    pub const fn grant(action: Action, scope: Scope) -> Self {
        Self::Grant { action, scope }
    }

    /// Whether this entry alone authorizes `action` with `scope`.
    /// `all` subsumes `own` and `public` for the same action.
    pub fn authorizes(&self, action: Action, scope: Scope) -> bool {
        match *self {
            Self::Wildcard => true,
            Self::Grant { action: granted, scope: granted_scope } => {
                granted == action && (granted_scope == scope || granted_scope == Scope::All)
            }
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("*"),
            Self::Grant { action, scope } => write!(f, "{}:{}", action, scope),
        }
    }
}

impl FromStr for Permission {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(Self::Wildcard);
        }
        let (action, scope) = s
            .split_once(':')
            .ok_or_else(|| UnknownTag::new("permission", s))?;
        Ok(Self::Grant {
            action: action.parse()?,
            scope: scope.parse()?,
        })
    }
}

/// Ordered permission set. Declaration order is significant for
/// first-match lookups, so this is a slice rather than a hash set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    pub fn new(entries: impl IntoIterator<Item = Permission>) -> Self {
        let mut set: Vec<Permission> = Vec::new();
        for entry in entries {
            if !set.contains(&entry) {
                set.push(entry);
            }
        }
        Self(set)
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff the set holds `action:scope`, `action:all` or `*`
    pub fn allows(&self, action: Action, scope: Scope) -> bool {
        self.contains(&Permission::grant(action, scope))
            || self.contains(&Permission::grant(action, Scope::All))
            || self.contains(&Permission::Wildcard)
    }

    /// Scope of the first entry whose action matches, in declaration order
    pub fn first_scope_for(&self, action: Action) -> Option<Scope> {
        self.0.iter().find_map(|entry| match *entry {
            Permission::Wildcard => Some(Scope::All),
            Permission::Grant { action: granted, scope } if granted == action => Some(scope),
            Permission::Grant { .. } => None,
        })
    }
}
