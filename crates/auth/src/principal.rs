use serde::{Deserialize, Serialize};

use epicrm_core::UserId;

use crate::Role;

/// A resolved principal for authorization decisions.
///
/// An empty role list means "no roles", not "unknown": such a principal can
/// still reach its own user record through the self-access rule, and nothing
/// else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        Self { id, roles }
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }
}
