//! Trait definitions with mockall annotations for testing
//!
//! The supervisor talks to the outside world only through these seams: the
//! PID record, the OS process table, the port, the health route and the
//! desktop opener. Real implementations live in [`crate::services`].

use shared::Endpoint;
use std::path::{Path, PathBuf};

use crate::error::SupervisorResult;

/// Signal used while stopping a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Graceful termination (SIGTERM)
    Terminate,
    /// Forceful kill (SIGKILL)
    Kill,
}

/// Everything needed to launch the backend detached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: PathBuf,
    /// Truncated at spawn; receives stdout and stderr
    pub log_file: PathBuf,
}

/// Persistent store for the recorded backend PID
///
/// The record is a hint, never proof of liveness: callers must corroborate
/// it with [`ProcessControl::is_alive`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait PidStore: Send + Sync {
    /// Read the recorded PID; `None` when absent or unreadable garbage
    async fn load(&self) -> SupervisorResult<Option<u32>>;

    /// Persist `pid`, replacing any previous record
    async fn save(&self, pid: u32) -> SupervisorResult<()>;

    /// Remove the record; removing a missing record is not an error
    async fn clear(&self) -> SupervisorResult<()>;
}

/// OS process operations
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessControl: Send + Sync {
    /// Resolve a program name or path to a runnable executable
    fn resolve_program(&self, program: &str) -> SupervisorResult<PathBuf>;

    /// Launch a process that outlives us and return its PID without waiting
    async fn spawn_detached(&self, request: &SpawnRequest) -> SupervisorResult<u32>;

    /// Signal-0 style liveness check
    async fn is_alive(&self, pid: u32) -> bool;

    /// Deliver a stop signal
    async fn signal(&self, pid: u32, signal: StopSignal) -> SupervisorResult<()>;

    /// PIDs of processes with a listening socket on `port`
    async fn listeners_on_port(&self, port: u16) -> SupervisorResult<Vec<u32>>;
}

/// TCP-level liveness of the configured port
#[mockall::automock]
#[async_trait::async_trait]
pub trait PortProbe: Send + Sync {
    async fn is_listening(&self, endpoint: &Endpoint) -> bool;
}

/// HTTP readiness of the backend's health route
#[mockall::automock]
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_healthy(&self, endpoint: &Endpoint) -> bool;
}

/// Hands a local file to the OS-preferred viewer
#[mockall::automock]
pub trait Opener: Send + Sync {
    /// Fire-and-forget: must not wait for the viewer to exit
    fn open(&self, path: &Path) -> SupervisorResult<()>;
}
