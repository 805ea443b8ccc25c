//! Supervisor configuration
//!
//! Everything is resolved once at startup from CLI flags, environment
//! variables (optionally seeded from `.env`) and defaults, then passed to
//! the supervisor as an immutable [`SupervisorConfig`].

use clap::Args;
use shared::{Endpoint, SharedError};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SupervisorResult;

pub const PID_FILE_NAME: &str = "backend.pid";
pub const LOG_FILE_NAME: &str = "backend.log";
pub const LOCK_FILE_NAME: &str = "supervisor.lock";

/// Bounded readiness wait used by `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl HealthPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 20;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }

    /// Total sleep between health checks when every check fails. Request
    /// time comes on top.
    pub fn sleep_budget(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}

/// Termination escalation timings used by `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    /// Delay between SIGTERM and the SIGKILL decision
    pub grace: Duration,
    /// How long to wait for a killed process to disappear
    pub settle: Duration,
    /// Liveness re-check period while settling
    pub poll_interval: Duration,
}

impl StopPolicy {
    pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            grace: Self::DEFAULT_GRACE,
            settle: Self::DEFAULT_SETTLE,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// The backend launch line. `{host}` and `{port}` in arguments are
/// replaced with the endpoint values at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BackendCommand {
    pub const DEFAULT_PROGRAM: &'static str = "uvicorn";

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn default_args() -> Vec<String> {
        ["backend.app.main:app", "--host", "{host}", "--port", "{port}"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Arguments with endpoint placeholders substituted
    pub fn render_args(&self, endpoint: &Endpoint) -> Vec<String> {
        let port = endpoint.port.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{host}", &endpoint.host).replace("{port}", &port))
            .collect()
    }
}

impl Default for BackendCommand {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, Self::default_args())
    }
}

/// Resolved supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub endpoint: Endpoint,
    pub project_root: PathBuf,
    pub run_dir: PathBuf,
    pub static_dir: PathBuf,
    pub frontend_entry: PathBuf,
    pub backend: BackendCommand,
    pub health: HealthPolicy,
    pub stop: StopPolicy,
}

impl SupervisorConfig {
    /// Defaults laid out relative to `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            endpoint: Endpoint::default(),
            run_dir: project_root.join(".run"),
            static_dir: project_root.clone(),
            frontend_entry: project_root.join("frontend").join("index.html"),
            backend: BackendCommand::default(),
            health: HealthPolicy::default(),
            stop: StopPolicy::default(),
            project_root,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_run_dir(mut self, run_dir: impl Into<PathBuf>) -> Self {
        self.run_dir = run_dir.into();
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    pub fn with_frontend_entry(mut self, frontend_entry: impl Into<PathBuf>) -> Self {
        self.frontend_entry = frontend_entry.into();
        self
    }

    pub fn with_backend(mut self, backend: BackendCommand) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_health_policy(mut self, health: HealthPolicy) -> Self {
        self.health = health;
        self
    }

    pub fn with_stop_policy(mut self, stop: StopPolicy) -> Self {
        self.stop = stop;
        self
    }

    pub fn pid_file(&self) -> PathBuf {
        self.run_dir.join(PID_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.run_dir.join(LOG_FILE_NAME)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.run_dir.join(LOCK_FILE_NAME)
    }
}

/// Configuration flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Host the backend binds and is probed on
    #[arg(long, env = "HOST", default_value = Endpoint::DEFAULT_HOST, global = true)]
    pub host: String,

    /// Port the backend binds and is probed on
    #[arg(long, env = "PORT", default_value_t = Endpoint::DEFAULT_PORT, global = true)]
    pub port: u16,

    /// Health route that must answer with a success status
    #[arg(long, env = "HEALTH_PATH", default_value = Endpoint::DEFAULT_HEALTH_PATH, global = true)]
    pub health_path: String,

    /// Project root; relative paths below are resolved against it
    #[arg(long, env = "PROJECT_ROOT", global = true)]
    pub project_root: Option<PathBuf>,

    /// Directory holding the PID record, log and lock file
    #[arg(long, env = "RUN_DIR", global = true)]
    pub run_dir: Option<PathBuf>,

    /// Static-file root handed to the backend as STATIC_DIR
    #[arg(long, env = "STATIC_DIR", global = true)]
    pub static_dir: Option<PathBuf>,

    /// Local HTML entry opened by `open` and `run`
    #[arg(long = "frontend", env = "FRONTEND_ENTRY", global = true)]
    pub frontend_entry: Option<PathBuf>,

    /// Backend executable (looked up on PATH unless it contains a slash)
    #[arg(long, env = "BACKEND_PROGRAM", default_value = BackendCommand::DEFAULT_PROGRAM, global = true)]
    pub backend_program: String,

    /// Backend argument, repeatable; `{host}` and `{port}` are substituted
    #[arg(long = "backend-arg", allow_hyphen_values = true, global = true)]
    pub backend_args: Vec<String>,

    /// Number of health probes before `start` gives up waiting
    #[arg(long, default_value_t = HealthPolicy::DEFAULT_ATTEMPTS, global = true)]
    pub health_attempts: u32,

    /// Delay between health probes in milliseconds
    #[arg(long, default_value_t = HealthPolicy::DEFAULT_INTERVAL.as_millis() as u64, global = true)]
    pub health_interval_ms: u64,

    /// Grace period between SIGTERM and SIGKILL in milliseconds
    #[arg(long, default_value_t = StopPolicy::DEFAULT_GRACE.as_millis() as u64, global = true)]
    pub grace_ms: u64,
}

impl ConfigArgs {
    /// Resolve flags into a [`SupervisorConfig`]
    pub fn into_config(self) -> SupervisorResult<SupervisorConfig> {
        let project_root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let endpoint = Endpoint::new(self.host, self.port, self.health_path)?;

        if self.backend_program.trim().is_empty() {
            return Err(SharedError::invalid_config("backend_program", "").into());
        }
        let backend_args = if self.backend_args.is_empty() {
            BackendCommand::default_args()
        } else {
            self.backend_args
        };

        let mut config = SupervisorConfig::new(&project_root)
            .with_endpoint(endpoint)
            .with_backend(BackendCommand::new(self.backend_program, backend_args))
            .with_health_policy(HealthPolicy::new(
                self.health_attempts,
                Duration::from_millis(self.health_interval_ms),
            ))
            .with_stop_policy(StopPolicy::default().with_grace(Duration::from_millis(self.grace_ms)));

        if let Some(run_dir) = self.run_dir {
            config = config.with_run_dir(resolve(&project_root, run_dir));
        }
        if let Some(static_dir) = self.static_dir {
            config = config.with_static_dir(resolve(&project_root, static_dir));
        }
        if let Some(entry) = self.frontend_entry {
            config = config.with_frontend_entry(resolve(&project_root, entry));
        }

        Ok(config)
    }
}

fn resolve(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { root.join(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> SupervisorConfig {
        let mut argv = vec!["test", "--project-root", "/srv/quiz"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().config.into_config().unwrap()
    }

    #[test]
    fn test_defaults_relative_to_root() {
        let config = parse(&["--host", "127.0.0.1", "--port", "8000"]);
        assert_eq!(config.run_dir, PathBuf::from("/srv/quiz/.run"));
        assert_eq!(config.pid_file(), PathBuf::from("/srv/quiz/.run/backend.pid"));
        assert_eq!(config.log_file(), PathBuf::from("/srv/quiz/.run/backend.log"));
        assert_eq!(config.frontend_entry, PathBuf::from("/srv/quiz/frontend/index.html"));
        assert_eq!(config.static_dir, PathBuf::from("/srv/quiz"));
        assert_eq!(config.health, HealthPolicy::default());
        assert_eq!(config.health.sleep_budget(), Duration::from_millis(5700));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--host",
            "0.0.0.0",
            "--port",
            "9999",
            "--run-dir",
            "state",
            "--backend-program",
            "python3",
            "--backend-arg",
            "-m",
            "--backend-arg",
            "http.server",
            "--backend-arg",
            "{port}",
            "--health-attempts",
            "5",
            "--health-interval-ms",
            "100",
        ]);

        assert_eq!(config.endpoint.authority(), "0.0.0.0:9999");
        assert_eq!(config.run_dir, PathBuf::from("/srv/quiz/state"));
        assert_eq!(config.backend.program, "python3");
        assert_eq!(config.backend.render_args(&config.endpoint), vec!["-m", "http.server", "9999"]);
        assert_eq!(config.health, HealthPolicy::new(5, Duration::from_millis(100)));
    }

    #[test]
    fn test_default_backend_args_substitute_endpoint() {
        let endpoint = Endpoint::new("127.0.0.1", 8123, "/api/health").unwrap();
        let args = BackendCommand::default().render_args(&endpoint);
        assert_eq!(args, vec!["backend.app.main:app", "--host", "127.0.0.1", "--port", "8123"]);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = HealthPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.sleep_budget(), Duration::ZERO);
    }
}
