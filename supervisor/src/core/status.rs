//! Observed backend state and its interpretation
//!
//! The supervisor never trusts a persisted state machine. Every call
//! recomputes two independent facts (is the recorded PID alive, is anything
//! listening on the port) and derives a [`LifecycleStatus`] from them.

use serde::Serialize;
use shared::Endpoint;
use std::fmt;

/// The two liveness facts, recomputed on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservedState {
    /// PID found in the record, if any
    pub recorded_pid: Option<u32>,
    /// Whether `recorded_pid` names a live process (false when absent)
    pub pid_alive: bool,
    /// Whether something accepts connections on the configured port
    pub listening: bool,
}

impl ObservedState {
    pub fn new(recorded_pid: Option<u32>, pid_alive: bool, listening: bool) -> Self {
        Self {
            recorded_pid,
            pid_alive: recorded_pid.is_some() && pid_alive,
            listening,
        }
    }

    /// Interpret the 2x2 of PID liveness and port liveness
    pub fn interpret(&self) -> LifecycleStatus {
        let live_pid = self.recorded_pid.filter(|_| self.pid_alive);
        let stale_pid = self.recorded_pid.filter(|_| !self.pid_alive);

        match (live_pid, self.listening) {
            (Some(pid), true) => LifecycleStatus::Running { pid },
            (Some(pid), false) => LifecycleStatus::Starting { pid },
            (None, true) => LifecycleStatus::Unmanaged { stale_pid },
            (None, false) => LifecycleStatus::Stopped { stale_pid },
        }
    }
}

/// Human-level backend status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Recorded process alive and the port is listening
    Running { pid: u32 },
    /// Recorded process alive but nothing listens yet (or it crashed after fork)
    Starting { pid: u32 },
    /// Port is listening but not by a process we recorded
    Unmanaged { stale_pid: Option<u32> },
    /// Nothing listening, no live recorded process
    Stopped { stale_pid: Option<u32> },
}

impl LifecycleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleStatus::Running { .. } => "running",
            LifecycleStatus::Starting { .. } => "starting",
            LifecycleStatus::Unmanaged { .. } => "unmanaged",
            LifecycleStatus::Stopped { .. } => "stopped",
        }
    }

    /// Only a listening port counts as running
    pub fn is_listening(&self) -> bool {
        matches!(self, LifecycleStatus::Running { .. } | LifecycleStatus::Unmanaged { .. })
    }

    /// One-line description bound to an endpoint
    pub fn describe(&self, endpoint: &Endpoint) -> StatusLine<'_> {
        StatusLine {
            status: self,
            authority: endpoint.authority(),
        }
    }
}

/// Display adapter for `status` output
pub struct StatusLine<'a> {
    status: &'a LifecycleStatus,
    authority: String,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = &self.authority;
        match self.status {
            LifecycleStatus::Running { pid } => {
                write!(f, "listening on {at} (running, pid={pid})")
            }
            LifecycleStatus::Starting { pid } => {
                write!(f, "not listening on {at} yet (starting, pid={pid})")
            }
            LifecycleStatus::Unmanaged { stale_pid: None } => {
                write!(f, "listening on {at} (running, unmanaged process)")
            }
            LifecycleStatus::Unmanaged { stale_pid: Some(pid) } => {
                write!(f, "listening on {at} (running, unmanaged process, stale pid={pid})")
            }
            LifecycleStatus::Stopped { stale_pid: None } => {
                write!(f, "not listening on {at} (stopped)")
            }
            LifecycleStatus::Stopped { stale_pid: Some(pid) } => {
                write!(f, "not listening on {at} (stopped, stale pid={pid})")
            }
        }
    }
}

/// Serializable status snapshot for `status --json`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub endpoint: Endpoint,
    pub observed: ObservedState,
    pub status: LifecycleStatus,
    pub summary: String,
}

impl StatusReport {
    pub fn new(endpoint: &Endpoint, observed: ObservedState) -> Self {
        let status = observed.interpret();
        Self {
            endpoint: endpoint.clone(),
            observed,
            summary: status.describe(endpoint).to_string(),
            status,
        }
    }
}
