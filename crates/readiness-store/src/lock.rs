//! Advisory lock serializing read-modify-write cycles on the state file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fd_lock::{RwLock, RwLockWriteGuard};

/// A sidecar `<state>.lock` file. Holding its write guard excludes every
/// other process that locks the same state path.
pub struct StateLock {
    path: PathBuf,
    file: RwLock<File>,
}

impl StateLock {
    /// Open (creating if needed) the lock file next to `state_path`.
    pub fn open(state_path: &Path) -> Result<Self> {
        let path = lock_path(state_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        Ok(Self {
            path,
            file: RwLock::new(file),
        })
    }

    /// Block until the exclusive lock is held.
    pub fn write(&mut self) -> Result<RwLockWriteGuard<'_, File>> {
        let guard = self
            .file
            .write()
            .with_context(|| format!("failed to lock {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "state lock acquired");
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
