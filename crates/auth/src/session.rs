//! Local persistence of the active credentials.
//!
//! One token per file: `access_token` and `refresh_token` under a session
//! directory, overwritten on login/refresh and deleted on logout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const ACCESS_FILE: &str = "access_token";
const REFRESH_FILE: &str = "refresh_token";

/// An access token with its matching refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Where the calling context keeps its credentials between invocations.
pub trait SessionStore: Send + Sync {
    fn save(&self, pair: &TokenPair) -> Result<(), AuthError>;

    fn access_token(&self) -> Result<Option<String>, AuthError>;

    fn refresh_token(&self) -> Result<Option<String>, AuthError>;

    /// Forget both tokens. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Session files under a directory (e.g. `~/.epicrm/session`).
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn access_path(&self) -> PathBuf {
        self.dir.join(ACCESS_FILE)
    }

    pub fn refresh_path(&self) -> PathBuf {
        self.dir.join(REFRESH_FILE)
    }

    fn write(&self, path: &Path, token: &str) -> Result<(), AuthError> {
        let fail = |e: std::io::Error| {
            AuthError::session(format!("cannot write {}: {e}", path.display()))
        };

        std::fs::create_dir_all(&self.dir).map_err(fail)?;
        // NamedTempFile is created owner-only (0600 on unix).
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(fail)?;
        temp.write_all(token.as_bytes()).map_err(fail)?;
        temp.persist(path).map_err(|e| fail(e.error))?;
        Ok(())
    }

    fn read(path: &Path) -> Result<Option<String>, AuthError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::session(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    fn remove(path: &Path) -> Result<(), AuthError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::session(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, pair: &TokenPair) -> Result<(), AuthError> {
        self.write(&self.access_path(), &pair.access_token)?;
        self.write(&self.refresh_path(), &pair.refresh_token)
    }

    fn access_token(&self) -> Result<Option<String>, AuthError> {
        Self::read(&self.access_path())
    }

    fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        Self::read(&self.refresh_path())
    }

    fn clear(&self) -> Result<(), AuthError> {
        // Attempt both removals even if the first fails.
        let access = Self::remove(&self.access_path());
        let refresh = Self::remove(&self.refresh_path());
        access.and(refresh)
    }
}

/// Session kept in process memory (tests, embedded callers).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    pair: Mutex<Option<TokenPair>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_pair<T>(&self, f: impl FnOnce(&mut Option<TokenPair>) -> T) -> Result<T, AuthError> {
        let mut pair = self
            .pair
            .lock()
            .map_err(|_| AuthError::session("session lock poisoned"))?;
        Ok(f(&mut pair))
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, pair: &TokenPair) -> Result<(), AuthError> {
        self.with_pair(|slot| *slot = Some(pair.clone()))
    }

    fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.with_pair(|slot| slot.as_ref().map(|p| p.access_token.clone()))
    }

    fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        self.with_pair(|slot| slot.as_ref().map(|p| p.refresh_token.clone()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        self.with_pair(|slot| *slot = None)
    }
}
