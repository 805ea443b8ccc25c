//! Supervisor-specific error types

use shared::SharedError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Backend executable not found: {program} (set --backend-program or BACKEND_PROGRAM)")]
    BackendNotFound { program: String },

    #[error("Failed to launch backend {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Frontend entry not found: {} (open it manually once it exists)", path.display())]
    FrontendNotFound { path: PathBuf },

    #[error("No log file at {} (run `start` first)", path.display())]
    LogNotFound { path: PathBuf },

    #[error("PID record {operation} failed at {}: {message}", path.display())]
    PidStore {
        operation: String,
        path: PathBuf,
        message: String,
    },

    #[error("Could not lock run directory {}: {message}", path.display())]
    Lock { path: PathBuf, message: String },

    #[error("Failed to signal pid {pid}: {message}")]
    Signal { pid: u32, message: String },

    #[error("Could not list listeners on port {port}: {message}")]
    ListenerLookup { port: u16, message: String },

    #[error("Failed to launch opener for {}: {message}", path.display())]
    Opener { path: PathBuf, message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SupervisorError {
    pub fn spawn_failed(program: impl Into<String>, message: impl ToString) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            message: message.to_string(),
        }
    }

    pub fn pid_store(operation: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::PidStore {
            operation: operation.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn signal(pid: u32, message: impl ToString) -> Self {
        Self::Signal {
            pid,
            message: message.to_string(),
        }
    }

    pub fn lock(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Lock {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Precondition failures: reported, non-zero exit, nothing was changed
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::BackendNotFound { .. } | Self::FrontendNotFound { .. } | Self::LogNotFound { .. }
        )
    }
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_actionable() {
        let err = SupervisorError::BackendNotFound {
            program: "uvicorn".to_string(),
        };
        assert!(err.to_string().contains("BACKEND_PROGRAM"));
        assert!(err.is_precondition());

        let err = SupervisorError::FrontendNotFound {
            path: PathBuf::from("frontend/index.html"),
        };
        assert!(err.to_string().contains("frontend/index.html"));
        assert!(err.to_string().contains("manually"));

        let err = SupervisorError::lock("/tmp/run/supervisor.lock", "busy");
        assert!(!err.is_precondition());
    }
}
