//! Revocation ledger: the durable allowlist of honorable token ids (jti).
//!
//! A jti is added when its token is issued and removed on logout, rotation or
//! explicit revocation. Absence means "reject", even for a token whose
//! signature and expiry are fine.

pub mod file;
pub mod in_memory;

pub use file::FileLedger;
pub use in_memory::InMemoryLedger;

use crate::error::LedgerError;

/// Storage boundary for the revocation ledger.
///
/// Implementations must make every call atomic with respect to concurrent
/// callers: readers observe the set either before or after a mutation, never
/// in between.
pub trait RevocationLedger: Send + Sync {
    /// Register a newly issued jti.
    fn add(&self, jti: &str) -> Result<(), LedgerError>;

    /// Register several jtis in one step.
    fn add_many(&self, jtis: &[&str]) -> Result<(), LedgerError> {
        for jti in jtis {
            self.add(jti)?;
        }
        Ok(())
    }

    /// Remove `jti` if present and report whether this call removed it.
    ///
    /// This is the compare-and-delete used by refresh-token rotation: of two
    /// concurrent callers taking the same jti, exactly one sees `true`.
    fn take(&self, jti: &str) -> Result<bool, LedgerError>;

    /// Remove `jti`. Revoking an absent jti is a no-op.
    fn revoke(&self, jti: &str) -> Result<(), LedgerError> {
        self.take(jti).map(|_| ())
    }

    fn is_valid(&self, jti: &str) -> Result<bool, LedgerError>;

    /// Revoke everything.
    fn clear(&self) -> Result<(), LedgerError>;

    fn len(&self) -> Result<usize, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        self.len().map(|n| n == 0)
    }
}
