//! Configuration validation utilities

use crate::schema::{Config, Environment};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_admin(config, &mut report);
        Self::validate_service_url(config, &mut report);
        Self::validate_providers(config, &mut report);
        Self::validate_server(config, &mut report);
        Self::validate_authentication(config, &mut report);
        Self::validate_http_client(config, &mut report);
        Self::validate_logging(config, &mut report);

        report
    }

    fn validate_admin(config: &Config, report: &mut ValidationReport) {
        if config.admin.trim().is_empty() {
            report.add_error("admin", "Admin user name cannot be empty");
        } else if config.admin.trim() != config.admin {
            report.add_warning("admin", "Admin user name has surrounding whitespace and is compared exactly");
        }
    }

    fn validate_service_url(config: &Config, report: &mut ValidationReport) {
        let url = match config.service_base_url() {
            Ok(url) => url,
            Err(e) => {
                report.add_error("serviceUrl", &e);
                return;
            }
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            report.add_error("serviceUrl", "Backend URL must use http or https");
        }

        // Relative joins replace the last path segment of a base without a trailing slash
        if url.path() != "/" && !url.path().ends_with('/') {
            report.add_warning(
                "serviceUrl",
                &format!(
                    "Backend URL path '{}' has no trailing slash; relative API paths will replace its last segment",
                    url.path()
                ),
            );
        }

        if url.scheme() == "http" && config.environment == Environment::Production {
            report.add_warning("serviceUrl", "Backend is reached over plain HTTP in production");
        }
    }

    fn validate_providers(config: &Config, report: &mut ValidationReport) {
        let twitter = config.twitter();
        let google = config.google();

        if twitter.is_none() && google.is_none() {
            report.add_warning(
                "twitter/google",
                "No external login provider is configured; nobody will be able to sign in",
            );
        }

        if let Some(twitter) = twitter {
            if twitter.client_secret.is_empty() {
                report.add_error("twitter.consumerSecret", "Twitter consumer secret is required when a consumer key is set");
            }
        } else if config.twitter.as_ref().and_then(|t| t.consumer_secret.as_ref()).is_some() {
            report.add_warning("twitter.consumerKey", "Twitter consumer secret is set without a consumer key; Twitter sign-in stays disabled");
        }

        if let Some(google) = google {
            if google.client_secret.is_empty() {
                report.add_error("google.clientSecret", "Google client secret is required when a client ID is set");
            }
        } else if config.google.as_ref().and_then(|g| g.client_secret.as_ref()).is_some() {
            report.add_warning("google.clientID", "Google client secret is set without a client ID; Google sign-in stays disabled");
        }
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "Server port is below 1024, may require elevated privileges");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        } else if config.server.request_timeout_seconds > 300 {
            report.add_warning("server.request_timeout_seconds", "Request timeout is very high");
        }

        match config.server.https_port {
            Some(0) => report.add_error("server.https_port", "HTTPS port cannot be 0"),
            None if config.environment == Environment::Production => report.add_warning(
                "server.https_port",
                "No HTTPS port configured; HTTPS redirection is disabled",
            ),
            _ => {}
        }

        if !std::path::Path::new(&config.server.web_root).is_dir() {
            report.add_warning("server.web_root", "Static file directory does not exist");
        }

        if let Some(ref origin) = config.server.public_origin {
            match url::Url::parse(origin) {
                Ok(url) if url.path() == "/" && url.query().is_none() => {}
                Ok(_) => report.add_error("server.public_origin", "Public origin must not contain a path or query"),
                Err(e) => report.add_error("server.public_origin", &format!("Invalid public origin: {}", e)),
            }
        }
    }

    fn validate_authentication(config: &Config, report: &mut ValidationReport) {
        let auth = &config.authentication;

        match auth.secret {
            None => report.add_warning(
                "authentication.secret",
                "No cookie secret configured; sessions are lost when the process restarts",
            ),
            Some(ref secret) if secret.len() < crate::loader::MIN_SECRET_LEN => {
                report.add_error("authentication.secret", "Cookie secret is shorter than 32 bytes")
            }
            Some(_) => {}
        }

        if auth.expire_minutes == 0 {
            report.add_error("authentication.expire_minutes", "Session lifetime cannot be 0");
        } else if auth.expire_minutes < 5 {
            report.add_warning("authentication.expire_minutes", "Session lifetime is very short");
        }

        if !config.secure_cookies() && config.environment == Environment::Production {
            report.add_warning("authentication.secure_cookies", "Cookies are sent over plain HTTP in production");
        }

        let paths = [
            ("authentication.login_path", &auth.login_path),
            ("authentication.access_denied_path", &auth.access_denied_path),
            ("authentication.logout_path", &auth.logout_path),
        ];
        for (field, path) in paths {
            if !path.starts_with('/') {
                report.add_error(field, &format!("Path must start with '/': {}", path));
            }
        }

        if auth.login_path.eq_ignore_ascii_case(&auth.access_denied_path) {
            report.add_warning("authentication", "Login and access denied paths are the same");
        }
    }

    fn validate_http_client(config: &Config, report: &mut ValidationReport) {
        if config.http_client.timeout_seconds == 0 {
            report.add_error("http_client.timeout_seconds", "Backend timeout cannot be 0");
        } else if config.http_client.timeout_seconds > config.server.request_timeout_seconds {
            report.add_warning(
                "http_client.timeout_seconds",
                "Backend timeout exceeds the request timeout; slow backend calls will surface as request timeouts",
            );
        }

        if config.http_client.health_check_interval_seconds < 10 {
            report.add_warning("http_client.health_check_interval_seconds", "Health check interval is very low");
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error(
                "logging.level",
                &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels),
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error(
                "logging.format",
                &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats),
            );
        }

        if config.logging.level == "trace" || config.logging.level == "debug" {
            report.add_warning("logging.level", "Debug/trace logging may impact performance in production");
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }

    fn has_warning_for(&self, field: &str) -> bool {
        self.warnings.iter().any(|w| w.field == field)
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
