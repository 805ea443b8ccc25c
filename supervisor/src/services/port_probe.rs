//! TCP port liveness probe

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::traits::PortProbe;
use shared::{ComponentId, Endpoint, component_debug};

/// Probes the port by opening (and immediately dropping) a TCP connection
#[derive(Debug, Clone)]
pub struct TcpPortProbe {
    connect_timeout: Duration,
}

impl TcpPortProbe {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_listening(&self, endpoint: &Endpoint) -> bool {
        let authority = endpoint.authority();
        match timeout(self.connect_timeout, TcpStream::connect(&authority)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                component_debug!(ComponentId::current(), "🔌 {} not accepting: {}", authority, e);
                false
            }
            Err(_) => {
                component_debug!(ComponentId::current(), "⏰ Connect to {} timed out", authority);
                false
            }
        }
    }
}
