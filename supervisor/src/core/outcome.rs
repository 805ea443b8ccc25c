//! Results of the mutating lifecycle operations

use std::fmt;
use std::time::Duration;

/// What `start` achieved. Only precondition failures are errors; everything
/// here leaves the invocation successful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Something was already listening; nothing was spawned
    AlreadyRunning { pid: Option<u32> },
    /// Health probe succeeded on attempt `attempts`
    Healthy {
        pid: u32,
        attempts: u32,
        elapsed: Duration,
    },
    /// Probe budget exhausted; the backend is left running
    TimedOut { pid: u32, attempts: u32 },
    /// The launched process exited before becoming healthy
    ExitedEarly { pid: u32 },
}

impl StartOutcome {
    /// Warnings are printed but do not fail the invocation
    pub fn is_warning(&self) -> bool {
        matches!(self, StartOutcome::TimedOut { .. } | StartOutcome::ExitedEarly { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            StartOutcome::AlreadyRunning { pid } => *pid,
            StartOutcome::Healthy { pid, .. }
            | StartOutcome::TimedOut { pid, .. }
            | StartOutcome::ExitedEarly { pid } => Some(*pid),
        }
    }
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOutcome::AlreadyRunning { pid: Some(pid) } => {
                write!(f, "backend already running (pid={pid})")
            }
            StartOutcome::AlreadyRunning { pid: None } => {
                write!(f, "backend already running (port in use by an unmanaged process)")
            }
            StartOutcome::Healthy { pid, elapsed, .. } => {
                write!(f, "backend healthy (pid={pid}) after {}ms", elapsed.as_millis())
            }
            StartOutcome::TimedOut { pid, attempts } => write!(
                f,
                "backend (pid={pid}) not healthy after {attempts} probes; it may still be starting, check the log"
            ),
            StartOutcome::ExitedEarly { pid } => {
                write!(f, "backend (pid={pid}) exited before becoming healthy; check the log")
            }
        }
    }
}

/// What `stop` achieved. Signal failures are captured here instead of
/// being raised, so `stop` is always safe to re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Every targeted process is confirmed gone
    Stopped { pids: Vec<u32>, forced: bool },
    /// No live recorded process and nothing listening
    NothingToStop { stale_pid: Option<u32> },
    /// Signals were sent but at least one process could not be confirmed gone
    Unconfirmed { pids: Vec<u32>, reason: String },
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::Stopped { pids, forced } => {
                write!(f, "stopped pid {}", join_pids(pids))?;
                if *forced {
                    write!(f, " (killed after grace period)")?;
                }
                Ok(())
            }
            StopOutcome::NothingToStop { stale_pid: Some(pid) } => {
                write!(f, "not running (removed stale pid={pid})")
            }
            StopOutcome::NothingToStop { stale_pid: None } => write!(f, "not running"),
            StopOutcome::Unconfirmed { pids, reason } => {
                write!(f, "stop attempted for pid {} but not confirmed: {reason}", join_pids(pids))
            }
        }
    }
}

fn join_pids(pids: &[u32]) -> String {
    pids.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",")
}

/// Result of terminating one process with SIGTERM then SIGKILL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Exited,
    Killed,
    Survived { reason: String },
}

impl StopOutcome {
    /// Fold per-process terminations into one outcome
    pub fn from_terminations(results: Vec<(u32, Termination)>, stale_pid: Option<u32>) -> Self {
        if results.is_empty() {
            return StopOutcome::NothingToStop { stale_pid };
        }

        let pids: Vec<u32> = results.iter().map(|(pid, _)| *pid).collect();
        let failures: Vec<String> = results
            .iter()
            .filter_map(|(pid, t)| match t {
                Termination::Survived { reason } => Some(format!("pid {pid}: {reason}")),
                _ => None,
            })
            .collect();

        if failures.is_empty() {
            let forced = results.iter().any(|(_, t)| *t == Termination::Killed);
            StopOutcome::Stopped { pids, forced }
        } else {
            StopOutcome::Unconfirmed {
                pids,
                reason: failures.join("; "),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_terminations() {
        assert_eq!(
            StopOutcome::from_terminations(vec![], Some(3)),
            StopOutcome::NothingToStop { stale_pid: Some(3) }
        );

        assert_eq!(
            StopOutcome::from_terminations(vec![(10, Termination::Exited), (11, Termination::Killed)], None),
            StopOutcome::Stopped {
                pids: vec![10, 11],
                forced: true
            }
        );

        let outcome = StopOutcome::from_terminations(
            vec![
                (10, Termination::Exited),
                (
                    11,
                    Termination::Survived {
                        reason: "EPERM".to_string(),
                    },
                ),
            ],
            None,
        );
        match outcome {
            StopOutcome::Unconfirmed { pids, reason } => {
                assert_eq!(pids, vec![10, 11]);
                assert!(reason.contains("pid 11: EPERM"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_start_outcome_warnings() {
        assert!(StartOutcome::TimedOut { pid: 1, attempts: 20 }.is_warning());
        assert!(StartOutcome::ExitedEarly { pid: 1 }.is_warning());
        assert!(!StartOutcome::AlreadyRunning { pid: None }.is_warning());
        assert!(
            StartOutcome::TimedOut { pid: 1, attempts: 20 }
                .to_string()
                .contains("may still be starting")
        );
    }
}
