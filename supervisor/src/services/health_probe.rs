//! HTTP health probe against the backend's health route

use async_trait::async_trait;
use std::time::Duration;

use crate::traits::HealthProbe;
use shared::{ComponentId, Endpoint, component_debug};

/// GETs the health URL; any 2xx counts as healthy
#[derive(Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(request_timeout: Duration) -> Self {
        // Builder only fails when the TLS backend cannot initialise
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .no_proxy()
            // Idle keep-alive connections would hold up the backend's graceful shutdown
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn is_healthy(&self, endpoint: &Endpoint) -> bool {
        let url = endpoint.health_url();
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                component_debug!(ComponentId::current(), "🩺 {} answered {}", url, response.status());
                false
            }
            Err(e) => {
                component_debug!(ComponentId::current(), "🩺 {} unreachable: {}", url, e);
                false
            }
        }
    }
}
