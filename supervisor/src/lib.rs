//! Lifecycle supervisor for a single local backend process
//!
//! Starts the backend detached, waits for its health route, records its PID,
//! stops it with SIGTERM/SIGKILL escalation, reports status from two
//! independent liveness signals (recorded PID and port), opens the frontend
//! entry file and follows the backend log.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod supervisor;
pub mod traits;

// Re-export commonly used types
pub use config::{BackendCommand, ConfigArgs, HealthPolicy, StopPolicy, SupervisorConfig};
pub use core::{LifecycleStatus, ObservedState, StartOutcome, StatusReport, StopOutcome};
pub use error::{SupervisorError, SupervisorResult};
pub use supervisor::Supervisor;
pub use traits::{HealthProbe, Opener, PidStore, PortProbe, ProcessControl, SpawnRequest, StopSignal};

use services::{FilePidStore, HttpHealthProbe, RealProcessControl, SystemOpener, TcpPortProbe};

/// Supervisor wired to the real OS services
pub type RealSupervisor = Supervisor<FilePidStore, RealProcessControl, TcpPortProbe, HttpHealthProbe, SystemOpener>;

impl RealSupervisor {
    /// Build a supervisor over the file-backed PID record and real probes
    pub fn from_config(config: SupervisorConfig) -> Self {
        let pid_store = FilePidStore::new(config.pid_file());
        Supervisor::new(
            config,
            pid_store,
            RealProcessControl::new(),
            TcpPortProbe::new(),
            HttpHealthProbe::new(),
            SystemOpener::new(),
        )
    }
}
