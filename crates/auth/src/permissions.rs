use core::str::FromStr;

use serde::{Deserialize, Serialize};

use epicrm_core::DomainError;

/// A grantable right on a resource.
///
/// The `*_OWN` variants are distinct grants: holding `READ_OWN` does not imply
/// `READ`, and holding `UPDATE` does not imply `UPDATE_OWN`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Read,
    ReadOwn,
    Update,
    UpdateOwn,
    Delete,
    DeleteOwn,
    AdminOnly,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Create,
        Operation::Read,
        Operation::ReadOwn,
        Operation::Update,
        Operation::UpdateOwn,
        Operation::Delete,
        Operation::DeleteOwn,
        Operation::AdminOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Read => "READ",
            Operation::ReadOwn => "READ_OWN",
            Operation::Update => "UPDATE",
            Operation::UpdateOwn => "UPDATE_OWN",
            Operation::Delete => "DELETE",
            Operation::DeleteOwn => "DELETE_OWN",
            Operation::AdminOnly => "ADMIN_ONLY",
        }
    }

    /// The ownership-scoped counterpart used by the ownership grant path.
    ///
    /// `DELETE` maps to `DELETE_OWN`, never to `UPDATE_OWN`. Owned variants map
    /// to themselves; `CREATE` and `ADMIN_ONLY` have no owned form.
    pub fn owned_variant(self) -> Option<Operation> {
        match self {
            Operation::Read | Operation::ReadOwn => Some(Operation::ReadOwn),
            Operation::Update | Operation::UpdateOwn => Some(Operation::UpdateOwn),
            Operation::Delete | Operation::DeleteOwn => Some(Operation::DeleteOwn),
            Operation::Create | Operation::AdminOnly => None,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    /// Accepts `READ_OWN`, `read_own` and `read-own`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| DomainError::invalid("operation", format!("unknown operation '{s}'")))
    }
}
