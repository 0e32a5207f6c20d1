use std::collections::HashSet;
use std::sync::RwLock;

use super::RevocationLedger;
use crate::error::LedgerError;

/// In-memory revocation ledger.
///
/// Intended for tests/dev; nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    jtis: RwLock<HashSet<String>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationLedger for InMemoryLedger {
    fn add(&self, jti: &str) -> Result<(), LedgerError> {
        let mut jtis = self.jtis.write().map_err(|_| LedgerError::Poisoned)?;
        jtis.insert(jti.to_string());
        Ok(())
    }

    fn add_many(&self, batch: &[&str]) -> Result<(), LedgerError> {
        let mut jtis = self.jtis.write().map_err(|_| LedgerError::Poisoned)?;
        jtis.extend(batch.iter().map(|j| j.to_string()));
        Ok(())
    }

    fn take(&self, jti: &str) -> Result<bool, LedgerError> {
        let mut jtis = self.jtis.write().map_err(|_| LedgerError::Poisoned)?;
        Ok(jtis.remove(jti))
    }

    fn is_valid(&self, jti: &str) -> Result<bool, LedgerError> {
        let jtis = self.jtis.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(jtis.contains(jti))
    }

    fn clear(&self) -> Result<(), LedgerError> {
        let mut jtis = self.jtis.write().map_err(|_| LedgerError::Poisoned)?;
        jtis.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        let jtis = self.jtis.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(jtis.len())
    }
}
