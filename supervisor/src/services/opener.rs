//! Desktop opener for the frontend entry file

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{SupervisorError, SupervisorResult};
use crate::traits::Opener;
use shared::{ComponentId, component_debug};

/// Launches the OS-preferred viewer without waiting for it.
///
/// `BROWSER`, when set, takes precedence over the platform default.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener {
    program_override: Option<String>,
}

impl SystemOpener {
    pub fn new() -> Self {
        Self {
            program_override: std::env::var("BROWSER").ok().filter(|b| !b.trim().is_empty()),
        }
    }

    /// Use a specific opener program (fluent API)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program_override = Some(program.into());
        self
    }

    fn command_for(&self, target: &Path) -> Command {
        if let Some(program) = &self.program_override {
            let mut cmd = Command::new(program);
            cmd.arg(target);
            return cmd;
        }

        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        }

        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(target);
            cmd
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> SupervisorResult<()> {
        let mut cmd = self.command_for(path);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| SupervisorError::Opener {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        component_debug!(
            ComponentId::current(),
            "🌐 Opener {:?} (PID: {}) launched for {}",
            cmd.get_program(),
            child.id(),
            path.display()
        );
        Ok(())
    }
}
