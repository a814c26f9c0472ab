use std::collections::HashMap;
use std::sync::LazyLock;

use super::rate_limit::RateLimit;
use super::requirements::{AccountSnapshot, Requirement, RequirementCategory, RequirementCheck};
use super::types::{Action, Permission, PermissionSet, Resource, Role, Scope};

use Action::{Create, Delete, Read, Update};
use Scope::{All, Own, Public};

static STANDARD_POLICY: LazyLock<AccessPolicy> = LazyLock::new(AccessPolicy::standard);

const fn grant(action: Action, scope: Scope) -> Permission {
    Permission::grant(action, scope)
}

const OWN_CRUD: [Permission; 4] = [
    grant(Create, Own),
    grant(Read, Own),
    grant(Update, Own),
    grant(Delete, Own),
];

/// Immutable access policy: permission rows per (resource, role), requirement
/// buckets per (role, category) and a request budget per role.
///
/// Built once and shared by reference; there is no mutation API after construction.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    permissions: HashMap<(Resource, Role), PermissionSet>,
    requirements: HashMap<(Role, RequirementCategory), Vec<Requirement>>,
    rate_limits: HashMap<Role, RateLimit>,
}

impl AccessPolicy {
    /// Process-wide marketplace policy, constructed on first use
    pub fn global() -> &'static AccessPolicy {
        &STANDARD_POLICY
    }

    /// The marketplace policy table
    pub fn standard() -> Self {
        let mut builder = AccessPolicyBuilder::default();

        // Admin rows use the wildcard rather than any role special-casing.
        for resource in Resource::ALL {
            builder.permit(resource, Role::Admin, [Permission::Wildcard]);
        }

        builder
            .permit(Resource::User, Role::Customer, [grant(Read, Own), grant(Update, Own), grant(Delete, Own)])
            .permit(Resource::User, Role::Artisan, [grant(Read, Own), grant(Update, Own)])
            .permit(Resource::User, Role::Distributor, [grant(Read, Own), grant(Update, Own)]);

        builder
            .permit(Resource::Artisan, Role::Customer, [grant(Read, Public)])
            .permit(Resource::Artisan, Role::Artisan, [grant(Read, Own), grant(Update, Own), grant(Read, Public)])
            .permit(Resource::Artisan, Role::Distributor, [grant(Read, Public)]);

        builder
            .permit(Resource::Distributor, Role::Artisan, [grant(Read, Public)])
            .permit(Resource::Distributor, Role::Distributor, [grant(Read, Own), grant(Update, Own), grant(Read, Public)]);

        builder
            .permit(Resource::Product, Role::Customer, [grant(Read, Public)])
            .permit(Resource::Product, Role::Artisan, OWN_CRUD)
            .permit(Resource::Product, Role::Artisan, [grant(Read, Public)])
            .permit(Resource::Product, Role::Distributor, [grant(Read, All), grant(Update, Own)]);

        builder
            .permit(Resource::Order, Role::Customer, [grant(Create, Own), grant(Read, Own), grant(Update, Own)])
            .permit(Resource::Order, Role::Artisan, [grant(Read, Own), grant(Update, Own)])
            .permit(Resource::Order, Role::Distributor, [grant(Read, All), grant(Update, Own)]);

        builder
            .permit(Resource::Inventory, Role::Artisan, OWN_CRUD)
            .permit(Resource::Inventory, Role::Distributor, OWN_CRUD)
            .permit(Resource::Inventory, Role::Distributor, [grant(Read, All)]);

        for role in [Role::Customer, Role::Artisan, Role::Distributor] {
            builder.permit(Resource::Address, role, OWN_CRUD);
        }

        builder
            .require(Role::Artisan, RequirementCategory::ProductOperations, [Requirement::IdentityVerified])
            .require(Role::Artisan, RequirementCategory::BankDetailsUpdate, [Requirement::IdentityVerified])
            .require(Role::Artisan, RequirementCategory::InventoryOperations, [Requirement::IdentityVerified])
            .require(
                Role::Distributor,
                RequirementCategory::InventoryOperations,
                [Requirement::IdentityVerified, Requirement::CompleteAddress],
            )
            .require(Role::Distributor, RequirementCategory::BankDetailsUpdate, [Requirement::IdentityVerified])
            .require(Role::Customer, RequirementCategory::OrderOperations, [Requirement::CompleteAddress]);

        builder
            .limit(Role::Customer, RateLimit::per_minutes(15, 100))
            .limit(Role::Artisan, RateLimit::per_minutes(15, 200))
            .limit(Role::Distributor, RateLimit::per_minutes(15, 300))
            .limit(Role::Admin, RateLimit::per_minutes(15, 1000));

        builder.build()
    }

    pub fn permission_set(&self, role: Role, resource: Resource) -> Option<&PermissionSet> {
        self.permissions.get(&(resource, role))
    }

    /// Whether `role` may perform `action` with `scope` on `resource`.
    /// Pairs without a row are denied.
    pub fn has_permission(&self, role: Role, resource: Resource, action: Action, scope: Scope) -> bool {
        self.permission_set(role, resource)
            .is_some_and(|set| set.allows(action, scope))
    }

    /// String-tag form of [`has_permission`](Self::has_permission). Any tag that
    /// does not name a known role, resource, action or scope is denied.
    /// A missing scope means `own`.
    pub fn is_allowed(&self, role: &str, resource: &str, action: &str, scope: Option<&str>) -> bool {
        let (Ok(role), Ok(resource), Ok(action)) =
            (role.parse::<Role>(), resource.parse::<Resource>(), action.parse::<Action>())
        else {
            return false;
        };
        let scope = match scope {
            None => Scope::default(),
            Some(tag) => match tag.parse::<Scope>() {
                Ok(scope) => scope,
                Err(_) => return false,
            },
        };
        self.has_permission(role, resource, action, scope)
    }

    /// Scope of the first entry in the row granting `action`, in declaration order
    pub fn required_permission_level(&self, role: Role, resource: Resource, action: Action) -> Option<Scope> {
        self.permission_set(role, resource)
            .and_then(|set| set.first_scope_for(action))
    }

    pub fn requirements(&self, role: Role, category: RequirementCategory) -> Option<&[Requirement]> {
        self.requirements.get(&(role, category)).map(Vec::as_slice)
    }

    /// Evaluate the requirement bucket for `(role, category)` against `account`.
    /// No bucket means nothing to satisfy.
    pub fn check_requirements(
        &self,
        role: Role,
        category: RequirementCategory,
        account: &AccountSnapshot,
    ) -> RequirementCheck {
        match self.requirements(role, category) {
            None => RequirementCheck::Valid,
            Some(requirements) => RequirementCheck::evaluate(requirements, account),
        }
    }

    /// String-category form of [`check_requirements`](Self::check_requirements).
    /// Unknown categories have no bucket and therefore pass.
    pub fn check_requirements_for(&self, role: Role, category: &str, account: &AccountSnapshot) -> RequirementCheck {
        match category.parse::<RequirementCategory>() {
            Ok(category) => self.check_requirements(role, category, account),
            Err(_) => RequirementCheck::Valid,
        }
    }

    pub fn rate_limit(&self, role: Role) -> RateLimit {
        self.rate_limits
            .get(&role)
            .copied()
            .unwrap_or(DEFAULT_RATE_LIMIT)
    }
}

const DEFAULT_RATE_LIMIT: RateLimit = RateLimit::per_minutes(15, 100);

#[derive(Default)]
struct AccessPolicyBuilder {
    permissions: HashMap<(Resource, Role), Vec<Permission>>,
    requirements: HashMap<(Role, RequirementCategory), Vec<Requirement>>,
    rate_limits: HashMap<Role, RateLimit>,
}

impl AccessPolicyBuilder {
    /// Append entries to a row, keeping declaration order across calls
    fn permit(
        &mut self,
        resource: Resource,
        role: Role,
        entries: impl IntoIterator<Item = Permission>,
    ) -> &mut Self {
        self.permissions
            .entry((resource, role))
            .or_default()
            .extend(entries);
        self
    }

    fn require(
        &mut self,
        role: Role,
        category: RequirementCategory,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> &mut Self {
        self.requirements
            .entry((role, category))
            .or_default()
            .extend(requirements);
        self
    }

    fn limit(&mut self, role: Role, limit: RateLimit) -> &mut Self {
        self.rate_limits.insert(role, limit);
        self
    }

    fn build(self) -> AccessPolicy {
        AccessPolicy {
            permissions: self
                .permissions
                .into_iter()
                .map(|(key, entries)| (key, PermissionSet::new(entries)))
                .collect(),
            requirements: self.requirements,
            rate_limits: self.rate_limits,
        }
    }
}
