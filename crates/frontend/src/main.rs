//! Conference Planner front end - Main Application Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use config::{ConfigLoader, ConfigValidator, LoggingConfig};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod scheduler;
mod web;

use app::Application;

/// Server-rendered front end for the conference planner
#[derive(Debug, Parser)]
#[command(name = "frontend", version, about)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = "config.yaml")]
    config: PathBuf,

    /// Write an example configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_example: Option<PathBuf>,

    /// Load and validate the configuration, print the report and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();

    if let Some(path) = cli.write_example {
        ConfigLoader::create_example(&path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    init_logging(&config.logging)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    let report = ConfigValidator::validate(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }

    if cli.check {
        println!("{}", report.summary());
        for error in &report.errors {
            println!("error   {}: {}", error.field, error.message);
        }
        for warning in &report.warnings {
            println!("warning {}: {}", warning.field, warning.message);
        }
        if report.has_errors() {
            anyhow::bail!("Configuration is invalid");
        }
        return Ok(());
    }

    info!("Starting Conference Planner front end v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config.display());

    let mut app = Application::new(config)
        .await
        .context("Failed to create application")?;

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
        info!("Initiating graceful shutdown...");
    };

    if let Err(e) = app.run(shutdown_signal).await {
        tracing::error!("Application error: {:#}", e);
        return Err(e);
    }

    info!("Conference Planner front end shutdown complete");
    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match logging.format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    let level = env::var("RUST_LOG").unwrap_or_else(|_| logging.level.clone());
    info!(level = %level, format = %logging.format, "Logging initialized");

    if level == "trace" || level == "debug" {
        warn!("Debug/trace logging enabled - may impact performance in production");
    }

    Ok(())
}
