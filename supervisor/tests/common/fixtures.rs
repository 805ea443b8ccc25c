//! Test fixtures shared by the supervisor test suites

use shared::Endpoint;
use std::path::Path;
use std::time::Duration;
use supervisor::{HealthPolicy, StopPolicy, SupervisorConfig};

pub struct TestFixtures;

impl TestFixtures {
    /// PID handed out by the mocked spawn
    pub const BACKEND_PID: u32 = 4242;
    /// A process nobody recorded, e.g. a worker or a manually started server
    pub const FOREIGN_PID: u32 = 900;

    pub const PORT: u16 = 18_000;
    pub const HEALTH_ATTEMPTS: u32 = 3;
    pub const HEALTH_INTERVAL: Duration = Duration::from_millis(20);

    pub fn endpoint() -> Endpoint {
        Endpoint::new(Endpoint::DEFAULT_HOST, Self::PORT, Endpoint::DEFAULT_HEALTH_PATH).unwrap()
    }

    /// Fast policies so timeouts and escalation finish in milliseconds
    pub fn fast_stop_policy() -> StopPolicy {
        StopPolicy {
            grace: Duration::from_millis(30),
            settle: Duration::from_millis(30),
            poll_interval: Duration::from_millis(5),
        }
    }

    pub fn config(root: &Path) -> SupervisorConfig {
        SupervisorConfig::new(root)
            .with_endpoint(Self::endpoint())
            .with_health_policy(HealthPolicy::new(Self::HEALTH_ATTEMPTS, Self::HEALTH_INTERVAL))
            .with_stop_policy(Self::fast_stop_policy())
    }
}
