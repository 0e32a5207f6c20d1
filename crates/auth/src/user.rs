//! User accounts as seen by the authentication core.
//!
//! Accounts are owned by the user directory; this module only knows how to
//! turn one into a [`Principal`] and how to change its role list without
//! letting an actor escalate privileges.

use serde::{Deserialize, Serialize};

use epicrm_core::{DomainError, DomainResult, UserId};

use crate::authorize::{AuthorizationQuery, PermissionEngine};
use crate::permissions::Operation;
use crate::principal::Principal;
use crate::roles::Role;

/// Resource name guarding role assignment.
pub const USER_ROLE_RESOURCE: &str = "user_role";

/// A stored user: identity, credential hash and role names.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    /// Self-describing Argon2 hash string (PHC format).
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl core::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

impl UserAccount {
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.roles.iter().cloned())
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Grant `role` on behalf of `actor`.
    ///
    /// The actor needs `CREATE` on `user_role`; handing out the administrator
    /// role additionally requires the actor to be an administrator.
    pub fn assign_role(
        &mut self,
        role: Role,
        actor: &Principal,
        engine: &PermissionEngine,
    ) -> DomainResult<()> {
        if self.has_role(&role) {
            return Err(DomainError::already_exists(format!("role {role}")));
        }

        let query = AuthorizationQuery::new(actor, USER_ROLE_RESOURCE, Operation::Create);
        if !engine.authorize(&query) {
            return Err(DomainError::Unauthorized);
        }
        if &role == engine.admin_role() && !engine.is_admin(actor) {
            tracing::warn!(actor = %actor.id, user = %self.id, "refused administrator role grant");
            return Err(DomainError::Unauthorized);
        }

        tracing::info!(actor = %actor.id, user = %self.id, role = %role, "role assigned");
        self.roles.push(role);
        Ok(())
    }

    /// Remove `role` on behalf of `actor`, who needs `DELETE` on `user_role`.
    pub fn revoke_role(
        &mut self,
        role: &Role,
        actor: &Principal,
        engine: &PermissionEngine,
    ) -> DomainResult<()> {
        if !self.has_role(role) {
            return Err(DomainError::not_found(format!("role {role}")));
        }

        let query = AuthorizationQuery::new(actor, USER_ROLE_RESOURCE, Operation::Delete);
        if !engine.authorize(&query) {
            return Err(DomainError::Unauthorized);
        }

        tracing::info!(actor = %actor.id, user = %self.id, role = %role, "role revoked");
        self.roles.retain(|r| r != role);
        Ok(())
    }
}
