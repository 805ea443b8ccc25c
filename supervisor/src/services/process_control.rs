//! Real OS process control
//!
//! Spawns the backend detached from our process group, checks liveness with
//! signal 0, delivers SIGTERM/SIGKILL through `nix` and discovers listening
//! processes with `lsof`.

use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{SupervisorError, SupervisorResult};
use crate::traits::{ProcessControl, SpawnRequest, StopSignal};
use shared::{ComponentId, component_debug, component_info};

/// Real process control implementation
#[derive(Debug, Default, Clone)]
pub struct RealProcessControl;

impl RealProcessControl {
    pub fn new() -> Self {
        Self
    }

    /// Parse `lsof -t` output: one PID per line
    fn parse_pid_lines(stdout: &str) -> Vec<u32> {
        let mut pids: Vec<u32> = stdout
            .lines()
            .filter_map(|line| line.trim().parse::<u32>().ok())
            .collect();
        pids.sort_unstable();
        pids.dedup();
        pids
    }

    /// Exited children of ours stay in the process table until reaped; reap
    /// without blocking so they stop looking alive.
    #[cfg(unix)]
    fn reap_if_child(pid: u32) -> bool {
        use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
        use nix::unistd::Pid;

        matches!(
            waitpid(Pid::from_raw(pid as i32), Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..))
        )
    }

    /// A zombie we cannot reap (reparented to a non-reaping init) is dead
    #[cfg(target_os = "linux")]
    fn is_zombie(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| {
                let after_name = stat.rsplit_once(')')?.1;
                after_name.split_whitespace().next().map(|state| state == "Z")
            })
            .unwrap_or(false)
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn is_zombie(_pid: u32) -> bool {
        false
    }
}

#[async_trait]
impl ProcessControl for RealProcessControl {
    fn resolve_program(&self, program: &str) -> SupervisorResult<PathBuf> {
        let not_found = || SupervisorError::BackendNotFound {
            program: program.to_string(),
        };

        if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
            let path = Path::new(program);
            return if is_executable(path) {
                Ok(path.to_path_buf())
            } else {
                Err(not_found())
            };
        }

        which::which(program).map_err(|_| not_found())
    }

    async fn spawn_detached(&self, request: &SpawnRequest) -> SupervisorResult<u32> {
        let program = request.program.display().to_string();

        if let Some(parent) = request.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Truncated on every start
        let log = File::create(&request.log_file)?;
        let log_err = log.try_clone()?;

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .current_dir(&request.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        for (key, value) in &request.env {
            cmd.env(key, value);
        }

        // Own process group: terminal signals aimed at us do not reach it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .map_err(|e| SupervisorError::spawn_failed(&program, e))?;
        let pid = child.id();

        // Dropping std's Child neither waits nor kills
        drop(child);

        component_info!(
            ComponentId::current(),
            "🚀 Launched {} (PID: {}) logging to {}",
            program,
            pid,
            request.log_file.display()
        );
        Ok(pid)
    }

    async fn is_alive(&self, pid: u32) -> bool {
        pid_alive(pid)
    }

    async fn signal(&self, pid: u32, stop_signal: StopSignal) -> SupervisorResult<()> {
        send_signal(pid, stop_signal)?;
        component_debug!(ComponentId::current(), "📤 Sent {:?} to process {}", stop_signal, pid);
        Ok(())
    }

    async fn listeners_on_port(&self, port: u16) -> SupervisorResult<Vec<u32>> {
        let output = tokio::process::Command::new("lsof")
            .arg("-t") // terse: PIDs only
            .arg(format!("-iTCP:{port}"))
            .arg("-sTCP:LISTEN")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SupervisorError::ListenerLookup {
                port,
                message: format!("lsof unavailable: {e}"),
            })?;

        if !output.status.success() {
            // lsof exits non-zero when nothing matches
            return Ok(vec![]);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let own_pid = std::process::id();
        Ok(Self::parse_pid_lines(&stdout)
            .into_iter()
            .filter(|pid| *pid != own_pid)
            .collect())
    }
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    if pid == 0 || pid > i32::MAX as u32 {
        return false;
    }
    if RealProcessControl::reap_if_child(pid) {
        return false;
    }

    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => !RealProcessControl::is_zombie(pid),
        // Exists but belongs to someone else
        Err(Errno::EPERM) => !RealProcessControl::is_zombie(pid),
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn send_signal(pid: u32, stop_signal: StopSignal) -> SupervisorResult<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if pid == 0 || pid > i32::MAX as u32 {
        return Err(SupervisorError::signal(pid, "pid out of range"));
    }

    let sig = match stop_signal {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    signal::kill(Pid::from_raw(pid as i32), sig).map_err(|e| SupervisorError::signal(pid, e))
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _stop_signal: StopSignal) -> SupervisorResult<()> {
    Err(SupervisorError::signal(pid, "signals are not supported on this platform"))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
