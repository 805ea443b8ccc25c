//! Service-specific tests
//!
//! Each service has its own test file; shared helpers live in `common`.


// Common test utilities for services
pub mod common {
    use shared::Endpoint;
    use std::net::SocketAddr;
    use std::time::Duration;

    /// Standard timeout for async operations in tests
    pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Endpoint pointing at a local test server
    pub fn endpoint_for(addr: &SocketAddr, health_path: &str) -> Endpoint {
        Endpoint::new(addr.ip().to_string(), addr.port(), health_path).expect("Valid test endpoint")
    }
}
