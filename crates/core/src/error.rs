//! Errors raised by domain rules: bad input, uniqueness, role changes.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A deterministic business-rule failure. Token and ledger failures live in
/// `epicrm-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value could not be accepted (`field` names what was checked).
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid user id: {0}")]
    InvalidId(String),

    /// The named entry is already present (user id, username, role).
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The named entry is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// The acting user may not make the change.
    #[error("actor is not allowed to make this change")]
    Unauthorized,
}

impl DomainError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
