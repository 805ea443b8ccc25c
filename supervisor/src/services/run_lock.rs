//! Exclusive advisory lock over the run directory
//!
//! `stop` holds it for its whole duration; `start` only until the PID is
//! recorded. Racing invocations serialise instead of interleaving
//! PID-record updates.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{SupervisorError, SupervisorResult};
use shared::{ComponentId, component_debug};

/// Held lock; released on drop
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Block until the lock at `path` is ours
    pub async fn acquire(path: impl Into<PathBuf>) -> SupervisorResult<Self> {
        let path = path.into();
        let lock_path = path.clone();

        tokio::task::spawn_blocking(move || Self::acquire_blocking(lock_path))
            .await
            .map_err(|e| SupervisorError::lock(&path, e))?
    }

    /// Take the lock only if nobody holds it
    pub fn try_acquire(path: impl Into<PathBuf>) -> SupervisorResult<Option<Self>> {
        let path = path.into();
        let file = Self::open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(SupervisorError::lock(&path, e)),
        }
    }

    fn acquire_blocking(path: PathBuf) -> SupervisorResult<Self> {
        let file = Self::open(&path)?;
        file.lock_exclusive().map_err(|e| SupervisorError::lock(&path, e))?;
        component_debug!(ComponentId::current(), "🔒 Acquired {}", path.display());
        Ok(Self { file, path })
    }

    fn open(path: &Path) -> SupervisorResult<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SupervisorError::lock(path, e))?;
        }
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| SupervisorError::lock(path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
