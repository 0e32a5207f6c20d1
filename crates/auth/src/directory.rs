//! Read-only lookup of user accounts.
//!
//! The business-records store owns users; authentication only needs to find
//! one by login name or by id.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use epicrm_core::{DomainError, DomainResult, UserId};

use crate::error::{AuthError, AuthResult};
use crate::user::UserAccount;

pub trait UserDirectory: Send + Sync {
    fn find_by_username(&self, username: &str) -> AuthResult<Option<UserAccount>>;

    fn find_by_id(&self, id: UserId) -> AuthResult<Option<UserAccount>>;
}

/// Directory backed by a vector, for tests and embedding.
///
/// Accounts are only pushed after every check passes, so a lock poisoned by a
/// panicking holder still guards a consistent vector and is recovered on both
/// the read and write side.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<UserAccount>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account; ids and usernames are unique.
    pub fn insert(&self, account: UserAccount) -> DomainResult<()> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);

        if users.iter().any(|u| u.id == account.id) {
            return Err(DomainError::already_exists(format!("user id {}", account.id)));
        }
        if users.iter().any(|u| u.username == account.username) {
            return Err(DomainError::already_exists(format!("username {}", account.username)));
        }
        users.push(account);
        Ok(())
    }

    fn find(&self, pred: impl Fn(&UserAccount) -> bool) -> AuthResult<Option<UserAccount>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| pred(u)).cloned())
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_username(&self, username: &str) -> AuthResult<Option<UserAccount>> {
        self.find(|u| u.username == username)
    }

    fn find_by_id(&self, id: UserId) -> AuthResult<Option<UserAccount>> {
        self.find(|u| u.id == id)
    }
}

/// Directory read from a JSON array of accounts.
///
/// The file is re-read on every lookup so edits made by the records store
/// are seen without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    path: PathBuf,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> AuthResult<Vec<UserAccount>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AuthError::directory(format!("read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| AuthError::directory(format!("parse {}: {e}", self.path.display())))
    }
}

impl UserDirectory for JsonFileDirectory {
    fn find_by_username(&self, username: &str) -> AuthResult<Option<UserAccount>> {
        Ok(self.load()?.into_iter().find(|u| u.username == username))
    }

    fn find_by_id(&self, id: UserId) -> AuthResult<Option<UserAccount>> {
        Ok(self.load()?.into_iter().find(|u| u.id == id))
    }
}
