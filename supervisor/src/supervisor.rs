//! Backend lifecycle supervisor
//!
//! Owns the injected services and implements the five operations. No state
//! survives between calls except the PID record; every decision is made
//! from freshly observed facts.

use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::AsyncWrite;
use tokio::time::sleep;

use crate::config::SupervisorConfig;
use crate::core::{ObservedState, StartOutcome, StatusReport, StopOutcome, Termination};
use crate::error::{SupervisorError, SupervisorResult};
use crate::services::{LogFollower, RunLock};
use crate::traits::{HealthProbe, Opener, PidStore, PortProbe, ProcessControl, SpawnRequest, StopSignal};
use shared::logging;
use shared::{ComponentId, component_debug, component_error, component_info, component_warn};

/// Main supervisor with dependency injection
pub struct Supervisor<S, C, P, H, O>
where
    S: PidStore,
    C: ProcessControl,
    P: PortProbe,
    H: HealthProbe,
    O: Opener,
{
    config: SupervisorConfig,
    pid_store: S,
    process: C,
    port_probe: P,
    health_probe: H,
    opener: O,
}

impl<S, C, P, H, O> Supervisor<S, C, P, H, O>
where
    S: PidStore,
    C: ProcessControl,
    P: PortProbe,
    H: HealthProbe,
    O: Opener,
{
    /// Create a supervisor with injected services
    pub fn new(config: SupervisorConfig, pid_store: S, process: C, port_probe: P, health_probe: H, opener: O) -> Self {
        Self {
            config,
            pid_store,
            process,
            port_probe,
            health_probe,
            opener,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Launch the backend unless something already serves the port, then
    /// wait (bounded) for its health route.
    pub async fn start(&self) -> SupervisorResult<StartOutcome> {
        if let Some(outcome) = self.already_running().await {
            return Ok(outcome);
        }

        // Fail before touching the run directory
        let program = self.process.resolve_program(&self.config.backend.program)?;

        // Locked only until the PID is recorded; a stop may run during the wait
        let pid = {
            let _lock = RunLock::acquire(self.config.lock_file()).await?;

            // A racing start may have won while we waited for the lock
            if let Some(outcome) = self.already_running().await {
                return Ok(outcome);
            }

            let request = self.spawn_request(program);
            let pid = self.process.spawn_detached(&request).await?;

            // Record before polling so concurrent status/stop see us
            self.pid_store.save(pid).await?;
            pid
        };

        let outcome = self.wait_until_healthy(pid).await;
        match &outcome {
            StartOutcome::Healthy { .. } => logging::log_success(ComponentId::current(), &outcome.to_string()),
            _ => {
                component_warn!(ComponentId::current(), "⚠️ {}", outcome);
            }
        }
        Ok(outcome)
    }

    /// Terminate the backend: the recorded process first, then whatever
    /// still listens on the port. Signal failures are folded into the
    /// outcome; the PID record is removed on every path.
    pub async fn stop(&self) -> SupervisorResult<StopOutcome> {
        let _lock = RunLock::acquire(self.config.lock_file()).await?;
        let endpoint = &self.config.endpoint;

        let recorded = match self.pid_store.load().await {
            Ok(pid) => pid,
            Err(e) => {
                logging::log_swallowed(ComponentId::current(), "Reading PID record", &e);
                None
            }
        };

        let mut results: Vec<(u32, Termination)> = Vec::new();
        let mut stale_pid = None;

        if let Some(pid) = recorded {
            if self.process.is_alive(pid).await {
                component_info!(ComponentId::current(), "🛑 Stopping recorded backend (PID: {})", pid);
                results.push((pid, self.terminate(pid).await));
            } else {
                component_debug!(ComponentId::current(), "🪦 Recorded pid {} is not alive", pid);
                stale_pid = Some(pid);
            }
        }

        let mut lookup_error = None;
        if results.is_empty() || self.port_probe.is_listening(endpoint).await {
            match self.process.listeners_on_port(endpoint.port).await {
                Ok(pids) => {
                    for pid in pids {
                        if results.iter().any(|(done, _)| *done == pid) {
                            continue;
                        }
                        component_info!(
                            ComponentId::current(),
                            "🛑 Stopping listener on port {} (PID: {})",
                            endpoint.port,
                            pid
                        );
                        results.push((pid, self.terminate(pid).await));
                    }
                }
                Err(e) => {
                    logging::log_swallowed(ComponentId::current(), "Listener discovery", &e);
                    lookup_error = Some(e.to_string());
                }
            }
        }

        let cleared = self.pid_store.clear().await;

        let mut outcome = StopOutcome::from_terminations(results, stale_pid);
        if self.port_probe.is_listening(endpoint).await {
            let reason = match lookup_error {
                Some(e) => format!("port {} still listening ({e})", endpoint.port),
                None => format!("port {} still listening", endpoint.port),
            };
            outcome = match outcome {
                StopOutcome::Stopped { pids, .. } | StopOutcome::Unconfirmed { pids, .. } => {
                    StopOutcome::Unconfirmed { pids, reason }
                }
                StopOutcome::NothingToStop { .. } => StopOutcome::Unconfirmed { pids: vec![], reason },
            };
        }

        cleared?;

        match &outcome {
            StopOutcome::Unconfirmed { .. } => {
                component_warn!(ComponentId::current(), "⚠️ {}", outcome);
            }
            _ => logging::log_success(ComponentId::current(), &outcome.to_string()),
        }
        Ok(outcome)
    }

    /// Recompute both liveness facts. Never fails: an unreadable PID record
    /// is reported as absent.
    pub async fn observe(&self) -> ObservedState {
        let recorded = match self.pid_store.load().await {
            Ok(pid) => pid,
            Err(e) => {
                logging::log_swallowed(ComponentId::current(), "Reading PID record", &e);
                None
            }
        };

        let pid_alive = match recorded {
            Some(pid) => self.process.is_alive(pid).await,
            None => false,
        };
        let listening = self.port_probe.is_listening(&self.config.endpoint).await;

        ObservedState::new(recorded, pid_alive, listening)
    }

    /// Status snapshot; pure read
    pub async fn status(&self) -> StatusReport {
        let report = StatusReport::new(&self.config.endpoint, self.observe().await);
        component_debug!(ComponentId::current(), "📊 Backend {}", report.status.label());
        report
    }

    /// Hand the frontend entry file to the system opener
    pub fn open_frontend(&self) -> SupervisorResult<PathBuf> {
        let entry = &self.config.frontend_entry;
        if !entry.is_file() {
            return Err(SupervisorError::FrontendNotFound { path: entry.clone() });
        }

        self.opener.open(entry)?;
        component_info!(ComponentId::current(), "🌐 Opened {}", entry.display());
        Ok(entry.clone())
    }

    /// Stream the backend log into `out` until `until` resolves
    pub async fn tail_log<W, F>(&self, out: &mut W, lines: usize, until: F) -> SupervisorResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
        F: Future<Output = ()> + Send,
    {
        LogFollower::new(self.config.log_file())
            .with_initial_lines(lines)
            .follow(out, until)
            .await
    }

    /// `Some` when a backend is already up (port listening) or still booting
    /// from an earlier start (recorded PID alive)
    async fn already_running(&self) -> Option<StartOutcome> {
        let observed = self.observe().await;
        let live_pid = observed.recorded_pid.filter(|_| observed.pid_alive);

        if observed.listening || live_pid.is_some() {
            component_info!(
                ComponentId::current(),
                "⏭️ Backend already running on {} (pid: {:?})",
                self.config.endpoint,
                live_pid
            );
            Some(StartOutcome::AlreadyRunning { pid: live_pid })
        } else {
            None
        }
    }

    fn spawn_request(&self, program: PathBuf) -> SpawnRequest {
        let endpoint = &self.config.endpoint;
        SpawnRequest {
            program,
            args: self.config.backend.render_args(endpoint),
            env: vec![
                ("HOST".to_string(), endpoint.host.clone()),
                ("PORT".to_string(), endpoint.port.to_string()),
                ("STATIC_DIR".to_string(), self.config.static_dir.display().to_string()),
            ],
            current_dir: self.config.project_root.clone(),
            log_file: self.config.log_file(),
        }
    }

    async fn wait_until_healthy(&self, pid: u32) -> StartOutcome {
        let policy = self.config.health;
        let endpoint = &self.config.endpoint;
        let started = Instant::now();

        component_debug!(
            ComponentId::current(),
            "🩺 Waiting for {} ({} probes every {:?}, {:?} of sleep at most)",
            endpoint.health_url(),
            policy.attempts,
            policy.interval,
            policy.sleep_budget()
        );

        for attempt in 1..=policy.attempts {
            if self.health_probe.is_healthy(endpoint).await {
                return StartOutcome::Healthy {
                    pid,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                };
            }

            // A launcher that forks and exits still counts if the port is up
            if !self.process.is_alive(pid).await && !self.port_probe.is_listening(endpoint).await {
                return StartOutcome::ExitedEarly { pid };
            }

            if attempt < policy.attempts {
                sleep(policy.interval).await;
            }
        }

        StartOutcome::TimedOut {
            pid,
            attempts: policy.attempts,
        }
    }

    /// SIGTERM, wait up to the grace period, SIGKILL, wait to settle
    async fn terminate(&self, pid: u32) -> Termination {
        let policy = self.config.stop;

        if let Err(e) = self.process.signal(pid, StopSignal::Terminate).await {
            logging::log_swallowed(ComponentId::current(), "SIGTERM", &e);
        }
        if self.wait_for_exit(pid, policy.grace).await {
            component_debug!(ComponentId::current(), "✅ Process {} terminated gracefully", pid);
            return Termination::Exited;
        }

        component_warn!(ComponentId::current(), "🔨 Process {} didn't respond to SIGTERM, using SIGKILL", pid);
        let kill_error = self.process.signal(pid, StopSignal::Kill).await.err();
        if let Some(e) = &kill_error {
            logging::log_swallowed(ComponentId::current(), "SIGKILL", e);
        }
        if self.wait_for_exit(pid, policy.settle).await {
            return Termination::Killed;
        }

        let reason = match kill_error {
            Some(e) => e.to_string(),
            None => "still alive after SIGKILL".to_string(),
        };
        component_error!(ComponentId::current(), "💀 Process {} could not be stopped: {}", pid, reason);
        Termination::Survived { reason }
    }

    /// Poll liveness until gone or `window` elapses; true when gone
    async fn wait_for_exit(&self, pid: u32, window: std::time::Duration) -> bool {
        let deadline = Instant::now() + window;
        loop {
            if !self.process.is_alive(pid).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.config.stop.poll_interval).await;
        }
    }
}
