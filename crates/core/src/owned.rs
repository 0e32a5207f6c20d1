//! Ownership facts exposed by business records.

use crate::UserId;

/// A business record with an assigned owner (a client's sales contact, an
/// event's support contact, ...).
///
/// Authorization never inspects record shape: repositories hand the owner over
/// through this trait and the permission engine compares it with the caller.
pub trait Owned {
    /// The user currently responsible for the record, if one is assigned.
    fn owner_id(&self) -> Option<UserId>;
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner_id(&self) -> Option<UserId> {
        (**self).owner_id()
    }
}
