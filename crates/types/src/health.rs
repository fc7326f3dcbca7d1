//! Backend health tracking types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of the backend API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Backend is healthy and responding
    Healthy,
    /// Backend is not responding
    Unhealthy,
    /// No check has run yet
    Unknown,
}

/// Result of the most recent backend health check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    /// Backend base address
    pub base_url: String,
    /// Current health status
    pub status: HealthStatus,
    /// Response time in milliseconds
    pub response_time_ms: Option<u64>,
    /// Last check timestamp
    pub last_check: Option<DateTime<Utc>>,
    /// Error message if unhealthy
    pub error_message: Option<String>,
    /// Number of consecutive failures
    pub consecutive_failures: u32,
}

impl BackendHealth {
    /// Create a record for a backend that has not been checked yet
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            status: HealthStatus::Unknown,
            response_time_ms: None,
            last_check: None,
            error_message: None,
            consecutive_failures: 0,
        }
    }

    /// Mark as healthy with response time
    pub fn mark_healthy(&mut self, response_time_ms: u64) {
        self.status = HealthStatus::Healthy;
        self.response_time_ms = Some(response_time_ms);
        self.last_check = Some(Utc::now());
        self.error_message = None;
        self.consecutive_failures = 0;
    }

    /// Mark as unhealthy with error message
    pub fn mark_unhealthy(&mut self, error_message: String) {
        self.status = HealthStatus::Unhealthy;
        self.response_time_ms = None;
        self.last_check = Some(Utc::now());
        self.error_message = Some(error_message);
        self.consecutive_failures += 1;
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
