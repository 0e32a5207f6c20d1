//! Roles and the static role → rule table.
//!
//! Roles are data: a role name keys into [`RoleRules`], which maps resources
//! to the operations the role may perform. Nothing here is polymorphic, so the
//! table can be loaded from a JSON document and edited without recompiling.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::permissions::Operation;

/// Resource key granting operations across every resource.
pub const WILDCARD_RESOURCE: &str = "*";

/// Name of the built-in administrator role.
pub const ADMIN_ROLE: &str = "admin";

/// Role identifier used for RBAC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations a role may perform, per resource name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(HashMap<String, BTreeSet<Operation>>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `ops` on `resource` (additive).
    pub fn grant(
        mut self,
        resource: impl Into<String>,
        ops: impl IntoIterator<Item = Operation>,
    ) -> Self {
        self.0.entry(resource.into()).or_default().extend(ops);
        self
    }

    /// Exact-key lookup; the `"*"` key is only consulted when asked for by name.
    pub fn allows(&self, resource: &str, op: Operation) -> bool {
        self.0.get(resource).is_some_and(|ops| ops.contains(&op))
    }

    pub fn operations(&self, resource: &str) -> impl Iterator<Item = Operation> + '_ {
        self.0.get(resource).into_iter().flatten().copied()
    }
}

/// The role → [`RuleSet`] table consulted by the permission engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleRules(HashMap<Role, RuleSet>);

impl RoleRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role, rules: RuleSet) -> Self {
        self.0.insert(role, rules);
        self
    }

    pub fn rules_for(&self, role: &Role) -> Option<&RuleSet> {
        self.0.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.0.keys()
    }

    /// Parse a `{"role": {"resource": ["OP", ...]}}` document.
    pub fn from_json(document: &str) -> Result<Self, AuthError> {
        serde_json::from_str(document)
            .map_err(|e| AuthError::configuration(format!("invalid role rules: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let document = std::fs::read_to_string(path).map_err(|e| {
            AuthError::configuration(format!(
                "cannot read role rules at {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&document)
    }

    /// The default table for the records manager.
    pub fn builtin() -> Self {
        use Operation::*;

        RoleRules::new()
            .with_role(
                Role::new(ADMIN_ROLE),
                RuleSet::new().grant(WILDCARD_RESOURCE, [Create, Read, Update, Delete, AdminOnly]),
            )
            .with_role(
                Role::new("management"),
                RuleSet::new()
                    .grant("client", [Read])
                    .grant("contract", [Create, Read, Update])
                    .grant("event", [Read, Update])
                    .grant("user", [Create, Read, Update, Delete])
                    .grant("user_role", [Create, Read, Delete]),
            )
            .with_role(
                Role::new("sales"),
                RuleSet::new()
                    .grant("client", [Create, Read, UpdateOwn])
                    .grant("contract", [Read, UpdateOwn])
                    .grant("event", [Create, Read]),
            )
            .with_role(
                Role::new("support"),
                RuleSet::new()
                    .grant("client", [Read])
                    .grant("contract", [Read])
                    .grant("event", [Read, UpdateOwn]),
            )
    }
}
