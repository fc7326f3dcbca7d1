//! Backend health monitoring

use crate::client::{ApiClient, ApiResult};
use std::time::Duration;
use types::BackendHealth;

/// Tracks reachability of the backend across periodic checks
#[derive(Debug, Clone)]
pub struct BackendHealthMonitor {
    health: BackendHealth,
}

impl BackendHealthMonitor {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            health: BackendHealth::new(client.base_url().as_str()),
        }
    }

    pub fn health(&self) -> &BackendHealth {
        &self.health
    }

    /// Record the outcome of one [`ApiClient::health_check`]
    pub fn record(&mut self, result: &ApiResult<Duration>) -> &BackendHealth {
        match result {
            Ok(elapsed) => {
                tracing::debug!(
                    backend = %self.health.base_url,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend healthy"
                );
                self.health.mark_healthy(elapsed.as_millis() as u64);
            }
            Err(e) => {
                self.health.mark_unhealthy(e.to_string());
                tracing::warn!(
                    backend = %self.health.base_url,
                    error = %e,
                    consecutive_failures = self.health.consecutive_failures,
                    "Backend health check failed"
                );
            }
        }
        &self.health
    }
}
