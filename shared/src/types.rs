//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::errors::{SharedError, SharedResult};

/// Global component identity - set once at startup
static COMPONENT_ID: OnceLock<ComponentId> = OnceLock::new();

/// Fallback used when nothing called `init_*` (library use, tests)
static DEFAULT_COMPONENT: ComponentId = ComponentId::Supervisor;

/// Identifies which binary emitted a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// The lifecycle supervisor CLI
    Supervisor,
    /// The stand-in backend used by tests and demos
    StubBackend,
}

impl ComponentId {
    /// Initialize the global component ID for the supervisor
    pub fn init_supervisor() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::Supervisor)
    }

    /// Initialize the global component ID for the stub backend
    pub fn init_stub_backend() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::StubBackend)
    }

    /// Get the global component ID, defaulting to the supervisor
    pub fn current() -> &'static ComponentId {
        COMPONENT_ID.get().unwrap_or(&DEFAULT_COMPONENT)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Supervisor => write!(f, "supervisor"),
            ComponentId::StubBackend => write!(f, "stub_backend"),
        }
    }
}

/// Where the backend listens and how its readiness is probed.
///
/// Immutable once built; the supervisor reads it from configuration at
/// startup and never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub health_path: String,
}

impl Endpoint {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_HEALTH_PATH: &'static str = "/api/health";

    /// Build an endpoint, normalising the health path to start with `/`
    pub fn new(host: impl Into<String>, port: u16, health_path: impl Into<String>) -> SharedResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(SharedError::InvalidEndpoint {
                message: "host must not be empty".to_string(),
            });
        }
        if port == 0 {
            return Err(SharedError::InvalidEndpoint {
                message: "port must be non-zero".to_string(),
            });
        }

        let health_path = health_path.into();
        let health_path = if health_path.starts_with('/') {
            health_path
        } else {
            format!("/{health_path}")
        };

        Ok(Self {
            host,
            port,
            health_path,
        })
    }

    /// `host:port`, as used in status lines and TCP connects
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL of the health route
    pub fn health_url(&self) -> String {
        format!("http://{}{}", self.authority(), self.health_path)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            health_path: Self::DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.authority(), "127.0.0.1:8000");
        assert_eq!(endpoint.health_url(), "http://127.0.0.1:8000/api/health");
    }

    #[test]
    fn test_health_path_normalised() {
        let endpoint = Endpoint::new("localhost", 9999, "healthz").unwrap();
        assert_eq!(endpoint.health_path, "/healthz");
        assert_eq!(endpoint.health_url(), "http://localhost:9999/healthz");
    }

    #[test]
    fn test_rejects_empty_host_and_zero_port() {
        assert!(Endpoint::new("", 8000, "/api/health").is_err());
        assert!(Endpoint::new("127.0.0.1", 0, "/api/health").is_err());
    }

    #[test]
    fn test_component_display() {
        assert_eq!(ComponentId::Supervisor.to_string(), "supervisor");
        assert_eq!(ComponentId::StubBackend.to_string(), "stub_backend");
    }
}
