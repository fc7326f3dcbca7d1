//! Background task scheduler

use crate::app::AppState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Background task scheduler
#[derive(Debug)]
pub struct Scheduler {
    state: Arc<AppState>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, handle: None }
    }

    /// Spawn the periodic tasks; a second call while running is a no-op
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let state = self.state.clone();
        self.handle = Some(tokio::spawn(run_periodic(state)));
        info!("Background scheduler started");
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the periodic tasks and wait for the task to exit
    pub async fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        handle.abort();
        match handle.await {
            Err(e) if !e.is_cancelled() => warn!(error = %e, "Scheduler task failed"),
            _ => info!("Scheduler stopped"),
        }
    }

    /// Probe the backend and record the outcome
    pub async fn check_backend_health(&self) {
        check_backend_health(&self.state).await;
    }
}

async fn run_periodic(state: Arc<AppState>) {
    let seconds = state.config.http_client.health_check_interval_seconds.max(1);
    let mut health_check_interval = interval(Duration::from_secs(seconds));
    health_check_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        health_check_interval.tick().await;
        check_backend_health(&state).await;
    }
}

async fn check_backend_health(state: &AppState) {
    debug!("Running backend health check");
    let result = state.api_client.health_check().await;
    state.backend_health.write().await.record(&result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Config;
    use types::HealthStatus;
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_health_check_updates_shared_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = Config {
            service_url: format!("{}/", server.uri()),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        let scheduler = Scheduler::new(state.clone());

        scheduler.check_backend_health().await;

        let monitor = state.backend_health.read().await;
        assert_eq!(monitor.health().status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unhealthy() {
        // Nothing listens on port 9 in the test environment
        let config = Config {
            service_url: "http://127.0.0.1:9/".to_string(),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        Scheduler::new(state.clone()).check_backend_health().await;

        let monitor = state.backend_health.read().await;
        assert_eq!(monitor.health().status, HealthStatus::Unhealthy);
        assert_eq!(monitor.health().consecutive_failures, 1);
        let message = monitor.health().error_message.as_deref().unwrap_or_default();
        assert!(message.contains("Failed to reach backend"));
        assert!(!message.contains("HTTP error"));
    }

    #[tokio::test]
    async fn test_start_runs_checks_until_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = Config {
            service_url: format!("{}/", server.uri()),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        let mut scheduler = Scheduler::new(state.clone());
        assert!(!scheduler.is_running());

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        // The first tick fires immediately
        for _ in 0..50 {
            if state.backend_health.read().await.health().status == HealthStatus::Healthy {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(state.backend_health.read().await.health().status, HealthStatus::Healthy);

        scheduler.shutdown().await;
        assert!(!scheduler.is_running());

        // Shutting down twice is harmless
        scheduler.shutdown().await;
    }
}
