//! Authentication/authorization error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use crate::claims::TokenType;

/// Result type used across the auth boundary.
pub type AuthResult<T> = Result<T, AuthError>;

/// Every failure the auth core can surface.
///
/// Callers match on the variant; the `Display` text is meant for logs, and
/// [`AuthError::user_message`] is the only text that should reach end users.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password (deliberately indistinguishable).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Signature is valid but the token is past its `exp`.
    #[error("token has expired")]
    Expired,

    /// Signature does not match (tampered token, foreign key or algorithm).
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token could not be parsed into a claims set.
    #[error("token is malformed")]
    Malformed,

    /// The token's jti is absent from the revocation ledger.
    #[error("token has been revoked")]
    Revoked,

    /// A token of the wrong kind was presented.
    #[error("expected {expected} but got {found}")]
    WrongTokenType { expected: TokenType, found: TokenType },

    /// Missing or placeholder secret, unsupported algorithm, bad duration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The authorization check failed.
    #[error("access denied")]
    PermissionDenied,

    /// A password to hash was empty.
    #[error("secret must not be empty")]
    InvalidSecret,

    /// No credentials are persisted for the calling context.
    #[error("no active session")]
    NotAuthenticated,

    /// The revocation ledger cannot be trusted; fail closed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The user directory could not be queried.
    #[error("user directory error: {0}")]
    Directory(String),

    /// Locally persisted credentials could not be read or written.
    #[error("session store error: {0}")]
    Session(String),
}

impl AuthError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn directory(msg: impl Into<String>) -> Self {
        Self::Directory(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// True for failures that mean "the caller is not (or no longer) logged in".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::Expired
                | AuthError::InvalidSignature
                | AuthError::Malformed
                | AuthError::Revoked
                | AuthError::WrongTokenType { .. }
                | AuthError::NotAuthenticated
        )
    }

    /// The message shown to end users. Never reveals which check failed.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid credentials",
            AuthError::PermissionDenied => "access denied",
            AuthError::NotAuthenticated => "not logged in, please log in",
            AuthError::InvalidSecret => "password must not be empty",
            e if e.is_unauthenticated() => "session expired or revoked, please log in again",
            _ => "authentication service unavailable",
        }
    }
}

/// Failures of the revocation ledger's backing store.
///
/// All of these are fatal for token validation: a ledger that cannot be read
/// must never be treated as empty.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger store at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
