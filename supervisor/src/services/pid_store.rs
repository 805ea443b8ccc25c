//! PID record implementations
//!
//! The file format is a single decimal integer followed by a newline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{SupervisorError, SupervisorResult};
use crate::traits::PidStore;
use shared::{ComponentId, component_debug, component_warn};

/// PID record backed by a plain file under the run directory
pub struct FilePidStore {
    path: PathBuf,
}

impl FilePidStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(contents: &str) -> Option<u32> {
        contents.trim().parse::<u32>().ok().filter(|pid| *pid > 0)
    }
}

#[async_trait]
impl PidStore for FilePidStore {
    async fn load(&self) -> SupervisorResult<Option<u32>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let pid = Self::parse(&contents);
                if pid.is_none() {
                    component_warn!(
                        ComponentId::current(),
                        "⚠️ Ignoring unparseable PID record at {}",
                        self.path.display()
                    );
                }
                Ok(pid)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SupervisorError::pid_store("read", &self.path, e)),
        }
    }

    async fn save(&self, pid: u32) -> SupervisorResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SupervisorError::pid_store("create dir", parent, e))?;
        }

        // Write then rename so readers never see a half-written record
        let tmp = self.path.with_extension("pid.tmp");
        fs::write(&tmp, format!("{pid}\n"))
            .await
            .map_err(|e| SupervisorError::pid_store("write", &tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SupervisorError::pid_store("rename", &self.path, e))?;

        component_debug!(ComponentId::current(), "📝 Recorded pid {} at {}", pid, self.path.display());
        Ok(())
    }

    async fn clear(&self) -> SupervisorResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                component_debug!(ComponentId::current(), "🧹 Removed PID record {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SupervisorError::pid_store("remove", &self.path, e)),
        }
    }
}

/// In-memory PID record for tests and embedding
#[derive(Default)]
pub struct MemoryPidStore {
    pid: Mutex<Option<u32>>,
}

impl MemoryPidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pid(pid: u32) -> Self {
        Self { pid: Mutex::new(Some(pid)) }
    }
}

#[async_trait]
impl PidStore for MemoryPidStore {
    async fn load(&self) -> SupervisorResult<Option<u32>> {
        Ok(*self.pid.lock().await)
    }

    async fn save(&self, pid: u32) -> SupervisorResult<()> {
        *self.pid.lock().await = Some(pid);
        Ok(())
    }

    async fn clear(&self) -> SupervisorResult<()> {
        *self.pid.lock().await = None;
        Ok(())
    }
}
