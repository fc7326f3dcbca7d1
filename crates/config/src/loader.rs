//! Configuration loader implementation

use crate::schema::Config;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::borrow::Cow;
use std::path::Path;
use types::ConfigError;

/// Minimum length of an explicitly configured cookie secret
pub const MIN_SECRET_LEN: usize = 32;

/// Camel-cased keys of the external configuration contract
const CAMEL_CASE_KEYS: &[&str] = &[
    "serviceUrl",
    "consumerKey",
    "consumerSecret",
    "clientID",
    "clientSecret",
];

/// Environment variable names carry no case; match YAML spelling per segment
fn canonical_env_key(key: &str) -> String {
    key.split('.')
        .map(|segment| {
            CAMEL_CASE_KEYS
                .iter()
                .find(|k| k.eq_ignore_ascii_case(segment))
                .map(|k| k.to_string())
                .unwrap_or_else(|| segment.to_ascii_lowercase())
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            }
            .into());
        }

        let config: Config = Figment::new()
            .merge(Yaml::file(config_path))
            // FRONTEND_TWITTER__CONSUMERKEY -> twitter.consumerKey
            .merge(
                Env::prefixed("FRONTEND_")
                    .split("__")
                    .lowercase(false)
                    .map(|key| Cow::<str>::Owned(canonical_env_key(key.as_str())).into()),
            )
            // Bare keys as documented for deployments
            .merge(
                Env::raw()
                    .only(&["admin", "serviceUrl"])
                    .lowercase(false)
                    .map(|key| Cow::<str>::Owned(canonical_env_key(key.as_str())).into()),
            )
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(config: &Config) -> Result<()> {
        if config.admin.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "admin".to_string(),
            }
            .into());
        }

        if config.service_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "serviceUrl".to_string(),
            }
            .into());
        }

        let base_url = config.service_base_url().map_err(|message| ConfigError::ValidationError {
            field: "serviceUrl".to_string(),
            message,
        })?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(ConfigError::ValidationError {
                field: "serviceUrl".to_string(),
                message: format!("Backend URL must use http or https: {}", config.service_url),
            }
            .into());
        }

        // A provider section with a key also needs its secret
        if let Some(twitter) = config.twitter() {
            if twitter.client_secret.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "twitter:consumerSecret".to_string(),
                }
                .into());
            }
        }

        if let Some(google) = config.google() {
            if google.client_secret.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "google:clientSecret".to_string(),
                }
                .into());
            }
        }

        // Validate server configuration
        if config.server.port == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.port".to_string(),
                message: "Server port cannot be 0".to_string(),
            }
            .into());
        }

        if config.server.https_port == Some(0) {
            return Err(ConfigError::ValidationError {
                field: "server.https_port".to_string(),
                message: "HTTPS port cannot be 0".to_string(),
            }
            .into());
        }

        if config.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.request_timeout_seconds".to_string(),
                message: "Request timeout cannot be 0".to_string(),
            }
            .into());
        }

        // Validate authentication configuration
        if let Some(ref secret) = config.authentication.secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::ValidationError {
                    field: "authentication.secret".to_string(),
                    message: format!("Cookie secret must be at least {} bytes", MIN_SECRET_LEN),
                }
                .into());
            }
        }

        if config.authentication.cookie_name.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "authentication.cookie_name".to_string(),
                message: "Cookie name cannot be empty".to_string(),
            }
            .into());
        }

        if config.authentication.expire_minutes == 0 {
            return Err(ConfigError::ValidationError {
                field: "authentication.expire_minutes".to_string(),
                message: "Session lifetime cannot be 0".to_string(),
            }
            .into());
        }

        let paths = [
            ("authentication.login_path", &config.authentication.login_path),
            ("authentication.access_denied_path", &config.authentication.access_denied_path),
            ("authentication.logout_path", &config.authentication.logout_path),
        ];
        for (field, path) in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: path.clone(),
                }
                .into());
            }
        }

        if config.http_client.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "http_client.timeout_seconds".to_string(),
                message: "Backend timeout cannot be 0".to_string(),
            }
            .into());
        }

        // Validate logging configuration
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_log_levels),
            }
            .into());
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_log_formats),
            }
            .into());
        }

        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
