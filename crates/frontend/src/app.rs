//! Main application structure and lifecycle management

use crate::scheduler::Scheduler;
use crate::web::{
    mvc::ControllerRegistry,
    routing::{RouteTemplate, DEFAULT_ROUTE},
    views::PageContext,
    WebServer,
};
use anyhow::{Context, Result};
use api_client::{ApiClient, BackendHealthMonitor};
use auth::{CookieAuthentication, ExternalProviders, PolicyOutcome, PolicyRegistry, ADMIN_POLICY};
use config::Config;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use types::Principal;

/// Shared state handed to every request handler
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub api_client: ApiClient,
    pub cookies: CookieAuthentication,
    pub policies: PolicyRegistry,
    pub providers: ExternalProviders,
    pub controllers: ControllerRegistry,
    pub route: RouteTemplate,
    pub backend_health: RwLock<BackendHealthMonitor>,
}

impl AppState {
    /// Build services from configuration
    pub fn new(config: Config) -> Result<Self> {
        let base_url = config
            .service_base_url()
            .map_err(anyhow::Error::msg)
            .context("Invalid backend address")?;
        let api_client = ApiClient::new(base_url, &config.http_client).context("Failed to create backend client")?;
        let backend_health = RwLock::new(BackendHealthMonitor::new(&api_client));

        let providers = ExternalProviders::from_config(&config).context("Failed to configure login providers")?;
        let route = RouteTemplate::parse(DEFAULT_ROUTE).context("Invalid default route")?;

        Ok(Self {
            cookies: CookieAuthentication::from_config(&config),
            policies: PolicyRegistry::for_admin(&config.admin),
            controllers: ControllerRegistry::with_defaults(),
            api_client,
            providers,
            route,
            backend_health,
            config,
        })
    }

    /// Whether `principal` satisfies the `Admin` policy
    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.policies
            .policy(ADMIN_POLICY)
            .is_some_and(|p| p.evaluate(principal) == PolicyOutcome::Allowed)
    }

    pub fn page_context<'a>(&self, principal: &'a Principal) -> PageContext<'a> {
        PageContext {
            principal,
            show_admin: self.is_admin(principal),
        }
    }
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    web_server: WebServer,
    scheduler: Scheduler,
}

impl Application {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        let state = Arc::new(AppState::new(config)?);

        let web_server = WebServer::new(state.clone()).context("Failed to create web server")?;
        let scheduler = Scheduler::new(state.clone());

        info!(
            backend = %state.api_client.base_url(),
            providers = ?state.providers.kinds(),
            environment = ?state.config.environment,
            "Application components initialized"
        );

        Ok(Self {
            state,
            web_server,
            scheduler,
        })
    }

    /// Serve requests until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Starting application services...");

        self.scheduler.start();

        let result = self.web_server.run(shutdown).await;

        self.shutdown().await?;

        result.context("Web server error")
    }

    /// Release background resources
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down application...");
        self.scheduler.shutdown().await;

        let health = self.state.backend_health.read().await;
        info!(
            status = ?health.health().status,
            consecutive_failures = health.health().consecutive_failures,
            "Last known backend health"
        );

        info!("Application shutdown complete");
        Ok(())
    }
}
