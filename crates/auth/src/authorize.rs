//! Role + ownership permission evaluation.
//!
//! - No IO
//! - No panics
//! - Denials carry no detail beyond "access denied"; the grant path that was
//!   tried is only visible in debug logs.

use serde::Serialize;

use epicrm_core::{Owned, UserId};

use crate::error::AuthError;
use crate::permissions::Operation;
use crate::principal::Principal;
use crate::roles::{ADMIN_ROLE, Role, RoleRules, WILDCARD_RESOURCE};

/// Resource name of user records (subject to the self-access rule).
pub const USER_RESOURCE: &str = "user";

/// One authorization question, built per call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationQuery<'a> {
    pub principal: &'a Principal,
    pub resource: &'a str,
    pub operation: Operation,
    /// Owner of the record acted upon, supplied by the record's repository.
    pub owner_id: Option<UserId>,
    /// Id of the user record acted upon (self-access rule).
    pub target_id: Option<UserId>,
    /// Ignore blanket role grants and only honor ownership-scoped ones.
    pub restrict_to_own: bool,
}

impl<'a> AuthorizationQuery<'a> {
    pub fn new(principal: &'a Principal, resource: &'a str, operation: Operation) -> Self {
        Self {
            principal,
            resource,
            operation,
            owner_id: None,
            target_id: None,
            restrict_to_own: false,
        }
    }

    pub fn owned_by(mut self, owner_id: Option<UserId>) -> Self {
        self.owner_id = owner_id;
        self
    }

    /// Take the owner from a business record.
    pub fn on_record(self, record: &impl Owned) -> Self {
        self.owned_by(record.owner_id())
    }

    pub fn targeting(mut self, target_id: Option<UserId>) -> Self {
        self.target_id = target_id;
        self
    }

    pub fn restrict_to_own(mut self, restrict: bool) -> Self {
        self.restrict_to_own = restrict;
        self
    }
}

/// Which precedence step allowed a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantPath {
    AdminWildcard,
    SelfAccess,
    DirectGrant,
    Ownership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "via")]
pub enum Decision {
    Allowed(GrantPath),
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

/// Evaluates queries against a static [`RoleRules`] table.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    rules: RoleRules,
    admin_role: Role,
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::new(RoleRules::builtin())
    }
}

impl PermissionEngine {
    pub fn new(rules: RoleRules) -> Self {
        Self {
            rules,
            admin_role: Role::new(ADMIN_ROLE),
        }
    }

    pub fn with_admin_role(mut self, role: Role) -> Self {
        self.admin_role = role;
        self
    }

    pub fn rules(&self) -> &RoleRules {
        &self.rules
    }

    pub fn admin_role(&self) -> &Role {
        &self.admin_role
    }

    /// Evaluate in fixed precedence order; the first matching step wins.
    ///
    /// 1. a role grants the operation on `"*"`;
    /// 2. the target is the caller's own user record;
    /// 3. a role grants the operation on the resource (skipped when
    ///    `restrict_to_own`);
    /// 4. the caller owns the record and a role grants the owned variant;
    /// 5. deny.
    pub fn evaluate(&self, query: &AuthorizationQuery<'_>) -> Decision {
        let principal = query.principal;
        let op = query.operation;

        let decision = if self.role_grants(principal, WILDCARD_RESOURCE, op) {
            Decision::Allowed(GrantPath::AdminWildcard)
        } else if query.resource == USER_RESOURCE && query.target_id == Some(principal.id) {
            Decision::Allowed(GrantPath::SelfAccess)
        } else if !query.restrict_to_own && self.role_grants(principal, query.resource, op) {
            Decision::Allowed(GrantPath::DirectGrant)
        } else if self.ownership_grants(query) {
            Decision::Allowed(GrantPath::Ownership)
        } else {
            Decision::Denied
        };

        tracing::debug!(
            principal = %principal.id,
            resource = query.resource,
            operation = %op,
            owner = ?query.owner_id,
            target = ?query.target_id,
            restrict_to_own = query.restrict_to_own,
            decision = ?decision,
            "authorization evaluated"
        );
        decision
    }

    pub fn authorize(&self, query: &AuthorizationQuery<'_>) -> bool {
        self.evaluate(query).is_allowed()
    }

    /// Like [`authorize`](Self::authorize) but as a typed result.
    pub fn ensure(&self, query: &AuthorizationQuery<'_>) -> Result<(), AuthError> {
        if self.authorize(query) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied)
        }
    }

    pub fn read_permission(
        &self,
        principal: &Principal,
        resource: &str,
        target_id: Option<UserId>,
        owner_id: Option<UserId>,
        restrict_to_own: bool,
    ) -> bool {
        self.check(principal, resource, Operation::Read, target_id, owner_id, restrict_to_own)
    }

    pub fn create_permission(
        &self,
        principal: &Principal,
        resource: &str,
        target_id: Option<UserId>,
        owner_id: Option<UserId>,
        restrict_to_own: bool,
    ) -> bool {
        self.check(principal, resource, Operation::Create, target_id, owner_id, restrict_to_own)
    }

    pub fn update_permission(
        &self,
        principal: &Principal,
        resource: &str,
        target_id: Option<UserId>,
        owner_id: Option<UserId>,
        restrict_to_own: bool,
    ) -> bool {
        self.check(principal, resource, Operation::Update, target_id, owner_id, restrict_to_own)
    }

    pub fn delete_permission(
        &self,
        principal: &Principal,
        resource: &str,
        target_id: Option<UserId>,
        owner_id: Option<UserId>,
        restrict_to_own: bool,
    ) -> bool {
        self.check(principal, resource, Operation::Delete, target_id, owner_id, restrict_to_own)
    }

    /// Name-based administrator check, independent of the rule table.
    pub fn is_admin(&self, principal: &Principal) -> bool {
        principal.roles.contains(&self.admin_role)
    }

    /// Hard gate for operations that bypass the rule table entirely.
    pub fn require_admin(&self, principal: &Principal) -> Result<(), AuthError> {
        if self.is_admin(principal) {
            Ok(())
        } else {
            tracing::debug!(principal = %principal.id, "administrator gate refused");
            Err(AuthError::PermissionDenied)
        }
    }

    fn check(
        &self,
        principal: &Principal,
        resource: &str,
        operation: Operation,
        target_id: Option<UserId>,
        owner_id: Option<UserId>,
        restrict_to_own: bool,
    ) -> bool {
        let query = AuthorizationQuery::new(principal, resource, operation)
            .targeting(target_id)
            .owned_by(owner_id)
            .restrict_to_own(restrict_to_own);
        self.authorize(&query)
    }

    fn role_grants(&self, principal: &Principal, resource: &str, op: Operation) -> bool {
        principal
            .roles
            .iter()
            .filter_map(|role| self.rules.rules_for(role))
            .any(|rules| rules.allows(resource, op))
    }

    fn ownership_grants(&self, query: &AuthorizationQuery<'_>) -> bool {
        if query.owner_id != Some(query.principal.id) {
            return false;
        }
        query
            .operation
            .owned_variant()
            .is_some_and(|owned| self.role_grants(query.principal, query.resource, owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RuleSet;
    use proptest::prelude::*;

    fn user(id: u64, roles: &[&'static str]) -> Principal {
        Principal::new(UserId::new(id), roles.iter().map(|r| Role::new(*r)))
    }

    fn engine() -> PermissionEngine {
        let rules = RoleRules::new()
            .with_role(
                Role::new("admin"),
                RuleSet::new().grant(
                    "*",
                    [Operation::Create, Operation::Read, Operation::Update, Operation::Delete],
                ),
            )
            .with_role(
                Role::new("sales"),
                RuleSet::new().grant(
                    "client",
                    [Operation::Create, Operation::Read, Operation::UpdateOwn],
                ),
            )
            .with_role(
                Role::new("support"),
                RuleSet::new().grant("event", [Operation::Read, Operation::UpdateOwn]),
            )
            .with_role(
                Role::new("manager"),
                RuleSet::new()
                    .grant(
                        "contract",
                        [Operation::Update, Operation::UpdateOwn, Operation::DeleteOwn],
                    )
                    .grant("client", [Operation::ReadOwn]),
            );
        PermissionEngine::new(rules)
    }

    fn ask(engine: &PermissionEngine, q: AuthorizationQuery<'_>) -> bool {
        engine.authorize(&q)
    }

    #[test]
    fn ownership_downgrade_for_sales() {
        let engine = engine();
        let p = user(7, &["sales"]);

        let update = |owner| {
            AuthorizationQuery::new(&p, "client", Operation::Update)
                .owned_by(Some(UserId::new(owner)))
        };
        assert!(ask(&engine, update(7)));
        assert!(!ask(&engine, update(8)));
        assert_eq!(engine.evaluate(&update(7)), Decision::Allowed(GrantPath::Ownership));

        let delete = AuthorizationQuery::new(&p, "client", Operation::Delete)
            .owned_by(Some(UserId::new(7)));
        assert!(!ask(&engine, delete));
    }

    #[test]
    fn update_without_owner_falls_back_to_direct_grant_only() {
        let engine = engine();
        let p = user(7, &["sales"]);
        assert!(!ask(&engine, AuthorizationQuery::new(&p, "client", Operation::Update)));
        assert!(ask(&engine, AuthorizationQuery::new(&p, "client", Operation::Read)));
    }

    #[test]
    fn admin_wildcard_overrides_everything() {
        let engine = engine();
        let admin = user(1, &["admin"]);

        let q = AuthorizationQuery::new(&admin, "anything", Operation::Delete)
            .owned_by(Some(UserId::new(99)))
            .restrict_to_own(true);
        assert_eq!(engine.evaluate(&q), Decision::Allowed(GrantPath::AdminWildcard));
        assert!(engine.delete_permission(&admin, "contract", None, None, false));
    }

    #[test]
    fn wildcard_only_covers_granted_operations() {
        let engine = engine();
        let admin = user(1, &["admin"]);
        assert!(!ask(&engine, AuthorizationQuery::new(&admin, "schema", Operation::AdminOnly)));
    }

    #[test]
    fn self_access_on_own_user_record() {
        let engine = engine();
        let p = user(7, &["support"]);

        let read = |target| {
            AuthorizationQuery::new(&p, "user", Operation::Read)
                .targeting(Some(UserId::new(target)))
        };
        let read_self = read(7);
        let read_other = read(9);
        assert!(ask(&engine, read_self));
        assert!(!ask(&engine, read_other));
        assert_eq!(engine.evaluate(&read_self), Decision::Allowed(GrantPath::SelfAccess));
    }

    #[test]
    fn self_access_is_limited_to_user_resource() {
        let engine = engine();
        let p = user(7, &["support"]);
        let q = AuthorizationQuery::new(&p, "client", Operation::Update)
            .targeting(Some(UserId::new(7)));
        assert!(!ask(&engine, q));
    }

    #[test]
    fn principal_without_roles_only_reaches_itself() {
        let engine = engine();
        let p = user(4, &[]);
        assert!(engine.update_permission(&p, "user", Some(UserId::new(4)), None, false));
        assert!(!engine.read_permission(&p, "client", None, Some(UserId::new(4)), false));
    }

    #[test]
    fn restrict_to_own_ignores_blanket_grants() {
        let engine = engine();
        let p = user(7, &["sales"]);

        // READ is granted, READ_OWN is not.
        assert!(engine.read_permission(&p, "client", None, Some(UserId::new(7)), false));
        assert!(!engine.read_permission(&p, "client", None, Some(UserId::new(7)), true));

        // UPDATE_OWN survives the restriction.
        assert!(engine.update_permission(&p, "client", None, Some(UserId::new(7)), true));
    }

    #[test]
    fn both_update_paths_are_checked() {
        let engine = engine();
        let m = user(3, &["manager"]);

        assert!(engine.update_permission(&m, "contract", None, Some(UserId::new(8)), false));
        assert!(engine.update_permission(&m, "contract", None, Some(UserId::new(3)), true));
        assert!(!engine.update_permission(&m, "contract", None, Some(UserId::new(8)), true));
    }

    #[test]
    fn delete_uses_delete_own_not_update_own() {
        let engine = engine();
        let m = user(3, &["manager"]);
        let s = user(7, &["sales"]);

        assert!(engine.delete_permission(&m, "contract", None, Some(UserId::new(3)), false));
        assert!(!engine.delete_permission(&m, "contract", None, Some(UserId::new(4)), false));
        // sales holds UPDATE_OWN on client but no DELETE_OWN.
        assert!(!engine.delete_permission(&s, "client", None, Some(UserId::new(7)), false));
    }

    #[test]
    fn roles_combine() {
        let engine = engine();
        let p = user(5, &["sales", "support"]);
        assert!(engine.create_permission(&p, "client", None, None, false));
        assert!(engine.update_permission(&p, "event", None, Some(UserId::new(5)), false));
        assert!(!engine.create_permission(&p, "event", None, None, false));
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let engine = engine();
        let p = user(5, &["intern"]);
        assert!(!engine.read_permission(&p, "client", None, None, false));
    }

    #[test]
    fn ensure_returns_typed_denial() {
        let engine = engine();
        let p = user(7, &["support"]);
        let q = AuthorizationQuery::new(&p, "contract", Operation::Create);
        assert!(matches!(engine.ensure(&q), Err(AuthError::PermissionDenied)));
    }

    #[test]
    fn admin_gate_is_name_based() {
        let engine = engine();
        assert!(engine.is_admin(&user(1, &["admin"])));
        assert!(!engine.is_admin(&user(2, &["manager"])));
        assert!(engine.require_admin(&user(2, &["manager"])).is_err());

        // A role granting "*" under another name does not pass the gate.
        let custom = PermissionEngine::new(
            RoleRules::new()
                .with_role(Role::new("root"), RuleSet::new().grant("*", Operation::ALL)),
        );
        let root = user(1, &["root"]);
        assert!(custom.read_permission(&root, "client", None, None, false));
        assert!(!custom.is_admin(&root));
        assert!(custom.clone().with_admin_role(Role::new("root")).is_admin(&root));
    }

    #[test]
    fn query_takes_owner_from_record() {
        struct Event {
            support_contact: Option<UserId>,
        }
        impl Owned for Event {
            fn owner_id(&self) -> Option<UserId> {
                self.support_contact
            }
        }

        let engine = engine();
        let p = user(7, &["support"]);
        let mine = Event { support_contact: Some(UserId::new(7)) };
        let theirs = Event { support_contact: None };

        let update = AuthorizationQuery::new(&p, "event", Operation::Update);
        assert!(ask(&engine, update.on_record(&mine)));
        assert!(!ask(&engine, update.on_record(&theirs)));
    }

    #[test]
    fn builtin_table_matches_business_roles() {
        let engine = PermissionEngine::default();
        let sales = user(10, &["sales"]);
        let support = user(11, &["support"]);
        let management = user(12, &["management"]);

        assert!(engine.create_permission(&sales, "client", None, None, false));
        assert!(!engine.update_permission(&sales, "contract", None, Some(UserId::new(99)), false));
        assert!(engine.update_permission(&support, "event", None, Some(UserId::new(11)), false));
        assert!(!engine.create_permission(&support, "client", None, None, false));
        assert!(engine.delete_permission(&management, "user", Some(UserId::new(10)), None, false));
        assert!(!engine.delete_permission(&management, "client", None, None, false));
    }

    fn any_operation() -> impl Strategy<Value = Operation> {
        prop::sample::select(Operation::ALL.to_vec())
    }

    fn any_resource() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["client", "contract", "event", "user", "user_role", "anything"])
    }

    fn any_roles() -> impl Strategy<Value = Vec<&'static str>> {
        prop::sample::subsequence(vec!["admin", "sales", "support", "manager", "intern"], 0..=3)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the admin wildcard allows every operation it lists on
        /// every resource, regardless of ownership facts.
        #[test]
        fn admin_always_allowed(
            resource in any_resource(),
            op in prop::sample::select(vec![
                Operation::Create,
                Operation::Read,
                Operation::Update,
                Operation::Delete,
            ]),
            owner in proptest::option::of(0u64..20),
            restrict in any::<bool>(),
        ) {
            let engine = engine();
            let admin = user(1, &["admin"]);
            let q = AuthorizationQuery::new(&admin, resource, op)
                .owned_by(owner.map(UserId::new))
                .restrict_to_own(restrict);
            prop_assert!(engine.authorize(&q));
        }

        /// Property: wrappers agree with `authorize` on every input.
        #[test]
        fn wrappers_match_authorize(
            roles in any_roles(),
            id in 0u64..10,
            resource in any_resource(),
            owner in proptest::option::of(0u64..10),
            target in proptest::option::of(0u64..10),
            restrict in any::<bool>(),
        ) {
            let engine = engine();
            let p = user(id, &roles);
            let owner = owner.map(UserId::new);
            let target = target.map(UserId::new);
            let via = |op| engine.authorize(
                &AuthorizationQuery::new(&p, resource, op)
                    .owned_by(owner)
                    .targeting(target)
                    .restrict_to_own(restrict),
            );

            let (t, o, r) = (target, owner, restrict);
            let e = &engine;
            prop_assert_eq!(e.read_permission(&p, resource, t, o, r), via(Operation::Read));
            prop_assert_eq!(e.create_permission(&p, resource, t, o, r), via(Operation::Create));
            prop_assert_eq!(e.update_permission(&p, resource, t, o, r), via(Operation::Update));
            prop_assert_eq!(e.delete_permission(&p, resource, t, o, r), via(Operation::Delete));
        }

        /// Property: restricting to own records never widens access.
        #[test]
        fn restriction_never_widens(
            roles in any_roles(),
            id in 0u64..10,
            resource in any_resource(),
            op in any_operation(),
            owner in proptest::option::of(0u64..10),
            target in proptest::option::of(0u64..10),
        ) {
            let engine = engine();
            let p = user(id, &roles);
            let base = AuthorizationQuery::new(&p, resource, op)
                .owned_by(owner.map(UserId::new))
                .targeting(target.map(UserId::new));

            let open = engine.authorize(&base);
            let restricted = engine.authorize(&base.restrict_to_own(true));
            prop_assert!(!restricted || open);
        }
    }
}
