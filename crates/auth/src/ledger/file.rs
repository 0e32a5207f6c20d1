use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fd_lock::RwLock as FileLock;

use super::RevocationLedger;
use crate::error::LedgerError;

/// File-backed revocation ledger (a JSON array of jtis).
///
/// Nothing is cached: every call takes an advisory lock on a sibling
/// `<file>.lock` (shared for reads, exclusive for writes), reads the current
/// set from disk and, for mutations, writes it back with a temp-file + rename
/// before releasing the lock. Separate handles, threads and processes on the
/// same path therefore see one serializable set. A file that cannot be read
/// or parsed is an error, never an empty set.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileLedger {
    /// Open the ledger at `path`, creating an empty one on first run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let parent = parent_dir(&path);
        std::fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;

        let ledger = Self {
            lock_path: lock_path_for(&path),
            path,
        };

        let mut lock = ledger.lock_file()?;
        let _guard = lock.write().map_err(|e| LedgerError::io(&ledger.lock_path, e))?;
        let entries = match std::fs::read_to_string(&ledger.path) {
            Ok(contents) => parse(&ledger.path, &contents)?.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                persist(&ledger.path, &BTreeSet::new())?;
                tracing::info!(
                    path = %ledger.path.display(),
                    "initialized empty revocation ledger"
                );
                0
            }
            Err(e) => return Err(LedgerError::io(&ledger.path, e)),
        };

        tracing::debug!(path = %ledger.path.display(), entries, "revocation ledger opened");
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<FileLock<File>, LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| LedgerError::io(&self.lock_path, e))?;
        Ok(FileLock::new(file))
    }

    /// Inspect the current on-disk set under a shared lock.
    fn read<T>(&self, inspect: impl FnOnce(&BTreeSet<String>) -> T) -> Result<T, LedgerError> {
        let lock = self.lock_file()?;
        let _guard = lock.read().map_err(|e| LedgerError::io(&self.lock_path, e))?;
        let jtis = load(&self.path)?;
        Ok(inspect(&jtis))
    }

    /// Re-read, change and persist the set under an exclusive lock.
    ///
    /// `change` returns `None` when nothing changed; the file is then left
    /// untouched.
    fn mutate<F, T>(&self, change: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut BTreeSet<String>) -> Option<T>,
        T: Default,
    {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(|e| LedgerError::io(&self.lock_path, e))?;

        let mut jtis = load(&self.path)?;
        let Some(outcome) = change(&mut jtis) else {
            return Ok(T::default());
        };

        persist(&self.path, &jtis).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist revocation ledger");
        })?;
        Ok(outcome)
    }
}

impl RevocationLedger for FileLedger {
    fn add(&self, jti: &str) -> Result<(), LedgerError> {
        self.add_many(&[jti])
    }

    fn add_many(&self, batch: &[&str]) -> Result<(), LedgerError> {
        self.mutate(|jtis| {
            let before = jtis.len();
            jtis.extend(batch.iter().map(|j| j.to_string()));
            (jtis.len() != before).then_some(())
        })
    }

    fn take(&self, jti: &str) -> Result<bool, LedgerError> {
        self.mutate(|jtis| jtis.remove(jti).then_some(true))
    }

    fn is_valid(&self, jti: &str) -> Result<bool, LedgerError> {
        self.read(|jtis| jtis.contains(jti))
    }

    fn clear(&self) -> Result<(), LedgerError> {
        self.mutate(|jtis| {
            let had_entries = !jtis.is_empty();
            jtis.clear();
            had_entries.then_some(())
        })
    }

    fn len(&self) -> Result<usize, LedgerError> {
        self.read(BTreeSet::len)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// A ledger file that vanished after `open` is an error, not an empty set.
fn load(path: &Path) -> Result<BTreeSet<String>, LedgerError> {
    let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
    parse(path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<BTreeSet<String>, LedgerError> {
    let entries: Vec<String> =
        serde_json::from_str(contents).map_err(|e| LedgerError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if entries.iter().any(|j| j.is_empty()) {
        return Err(LedgerError::Corrupt {
            path: path.to_path_buf(),
            reason: "empty jti entry".to_string(),
        });
    }
    Ok(entries.into_iter().collect())
}

fn persist(path: &Path, jtis: &BTreeSet<String>) -> Result<(), LedgerError> {
    let parent = parent_dir(path);
    let encoded = serde_json::to_vec(jtis).map_err(|e| LedgerError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| LedgerError::io(parent, e))?;
    temp.write_all(&encoded)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| LedgerError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| LedgerError::io(path, e.error))?;
    Ok(())
}
