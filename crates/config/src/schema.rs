//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// User name accepted by the `Admin` policy
    #[serde(default)]
    pub admin: String,
    /// Backend API base address
    #[serde(rename = "serviceUrl", alias = "service_url", default)]
    pub service_url: String,
    /// Twitter sign-in credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<TwitterConfig>,
    /// Google sign-in credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleConfig>,
    /// Hosting environment
    #[serde(default)]
    pub environment: Environment,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Cookie authentication configuration
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    /// Backend HTTP client configuration
    #[serde(default)]
    pub http_client: HttpClientConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Twitter section (`twitter:consumerKey`, `twitter:consumerSecret`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(rename = "consumerKey", alias = "consumer_key", default)]
    pub consumer_key: Option<String>,
    #[serde(rename = "consumerSecret", alias = "consumer_secret", default)]
    pub consumer_secret: Option<String>,
}

/// Google section (`google:clientID`, `google:clientSecret`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(rename = "clientID", alias = "clientId", alias = "client_id", default)]
    pub client_id: Option<String>,
    #[serde(rename = "clientSecret", alias = "client_secret", default)]
    pub client_secret: Option<String>,
}

/// Credentials of an enabled external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Hosting environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(alias = "Development")]
    Development,
    #[serde(alias = "Staging")]
    Staging,
    #[default]
    #[serde(alias = "Production")]
    Production,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Public HTTPS port; enables HTTPS redirection when set
    #[serde(default)]
    pub https_port: Option<u16>,
    /// Directory served as static files
    #[serde(default = "default_web_root")]
    pub web_root: String,
    /// Origin used to build OAuth redirect URIs (scheme://host[:port])
    #[serde(default)]
    pub public_origin: Option<String>,
}

/// Cookie authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    /// Auth cookie name
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// HMAC key for cookie signing (random per process when absent)
    #[serde(default)]
    pub secret: Option<String>,
    /// Session lifetime in minutes
    #[serde(default = "default_expire_minutes")]
    pub expire_minutes: u64,
    /// Re-issue the cookie once half the lifetime has elapsed
    #[serde(default = "default_true")]
    pub sliding_expiration: bool,
    /// Mark cookies `Secure` (defaults to true outside development)
    #[serde(default)]
    pub secure_cookies: Option<bool>,
    /// Where anonymous users are sent
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where unauthorized users are sent
    #[serde(default = "default_access_denied_path")]
    pub access_denied_path: String,
    /// Sign-out endpoint
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
}

/// Backend HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u64,
    /// User agent sent to the backend
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Backend health check interval in seconds
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_web_root() -> String {
    "wwwroot".to_string()
}

fn default_cookie_name() -> String {
    ".FrontEnd.Auth".to_string()
}

fn default_expire_minutes() -> u64 {
    14 * 24 * 60 // 14 days
}

fn default_login_path() -> String {
    "/Login".to_string()
}

fn default_access_denied_path() -> String {
    "/Denied".to_string()
}

fn default_logout_path() -> String {
    "/Logout".to_string()
}

fn default_client_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("conference-frontend/{}", env!("CARGO_PKG_VERSION"))
}

fn default_health_check_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Twitter credentials, present only when `twitter:consumerKey` is set
    pub fn twitter(&self) -> Option<ProviderCredentials> {
        let section = self.twitter.as_ref()?;
        let key = section.consumer_key.as_ref()?;
        Some(ProviderCredentials {
            client_id: key.clone(),
            client_secret: section.consumer_secret.clone().unwrap_or_default(),
        })
    }

    /// Google credentials, present only when `google:clientID` is set
    pub fn google(&self) -> Option<ProviderCredentials> {
        let section = self.google.as_ref()?;
        let id = section.client_id.as_ref()?;
        Some(ProviderCredentials {
            client_id: id.clone(),
            client_secret: section.client_secret.clone().unwrap_or_default(),
        })
    }

    /// Parse `serviceUrl` into the backend base address
    pub fn service_base_url(&self) -> Result<Url, String> {
        Url::parse(&self.service_url).map_err(|e| format!("Invalid serviceUrl '{}': {}", self.service_url, e))
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Whether cookies carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.authentication
            .secure_cookies
            .unwrap_or(!self.is_development())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin: "admin".to_string(),
            service_url: "http://localhost:56009/".to_string(),
            twitter: Some(TwitterConfig::default()),
            google: Some(GoogleConfig::default()),
            environment: Environment::Development,
            server: ServerConfig::default(),
            authentication: AuthenticationConfig::default(),
            http_client: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            https_port: None,
            web_root: default_web_root(),
            public_origin: None,
        }
    }
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: None,
            expire_minutes: default_expire_minutes(),
            sliding_expiration: default_true(),
            secure_cookies: None,
            login_path: default_login_path(),
            access_denied_path: default_access_denied_path(),
            logout_path: default_logout_path(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_client_timeout(),
            user_agent: default_user_agent(),
            health_check_interval_seconds: default_health_check_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_enabled_only_when_key_present() {
        let mut config = Config::default();
        assert!(config.twitter().is_none());
        assert!(config.google().is_none());

        config.google = Some(GoogleConfig {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            client_secret: Some("secret".to_string()),
        });
        let google = config.google().unwrap();
        assert_eq!(google.client_id, "id.apps.googleusercontent.com");
        assert_eq!(google.client_secret, "secret");

        config.twitter = Some(TwitterConfig {
            consumer_key: None,
            consumer_secret: Some("orphan".to_string()),
        });
        assert!(config.twitter().is_none());
    }

    #[test]
    fn test_secure_cookies_follow_environment() {
        let mut config = Config::default();
        assert!(!config.secure_cookies());

        config.environment = Environment::Production;
        assert!(config.secure_cookies());

        config.authentication.secure_cookies = Some(false);
        assert!(!config.secure_cookies());
    }
}
