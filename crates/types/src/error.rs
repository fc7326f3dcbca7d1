//! Error types for the conference planner front end

use thiserror::Error;

/// Main error type for the front end
#[derive(Error, Debug)]
pub enum FrontEndError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cookie or session authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Policy evaluation errors
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Backend API errors
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// External login provider errors
    #[error("External provider error: {provider}: {message}")]
    ExternalProvider { provider: String, message: String },

    /// Not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for front end operations
pub type Result<T> = std::result::Result<T, FrontEndError>;

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Signed ticket errors (auth cookie and correlation cookie payloads)
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TicketError {
    /// Value is not `payload.signature`
    #[error("Malformed ticket")]
    Malformed,

    /// HMAC does not match the payload
    #[error("Ticket signature invalid")]
    SignatureInvalid,

    /// Ticket lifetime has elapsed
    #[error("Ticket expired")]
    Expired,

    /// Signing key rejected by HMAC
    #[error("Invalid signing key")]
    InvalidKey,

    /// Payload could not be (de)serialized
    #[error("Ticket payload error: {0}")]
    Payload(String),
}

/// OAuth correlation errors raised on the provider callback
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CorrelationError {
    /// Correlation cookie absent from the callback request
    #[error("Correlation failed: cookie not found for {provider}")]
    MissingCookie { provider: String },

    /// `state` query parameter does not match the cookie
    #[error("Correlation failed: state mismatch for {provider}")]
    StateMismatch { provider: String },

    /// Callback arrived without an authorization code
    #[error("Authorization code missing from {provider} callback")]
    MissingCode { provider: String },

    /// Correlation cookie could not be verified
    #[error("Correlation cookie rejected: {0}")]
    Ticket(#[from] TicketError),
}

/// Backend HTTP client errors
#[derive(Error, Debug)]
pub enum ApiClientError {
    /// Relative path could not be joined onto the base address
    #[error("Invalid backend URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Request exceeded the configured timeout
    #[error("Backend request timed out: {url}")]
    Timeout { url: String },

    /// Connection could not be made or was dropped
    #[error("Failed to reach backend at {url}: {message}")]
    Transport { url: String, message: String },

    /// Non-success status
    #[error("Backend HTTP error for {url}: {status}")]
    Http { url: String, status: u16 },

    /// Response body was not the expected JSON
    #[error("Invalid backend response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// External login provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Provider redirected back with an `error` parameter
    #[error("{provider} returned an error: {error}")]
    Remote { provider: String, error: String },

    /// Authorization code could not be exchanged for a token
    #[error("{provider} token exchange failed: {message}")]
    TokenExchange { provider: String, message: String },

    /// Signed-in user could not be fetched or mapped
    #[error("{provider} user information unavailable: {message}")]
    UserInfo { provider: String, message: String },
}

// Conversion implementations for common error types

impl From<ConfigError> for FrontEndError {
    fn from(err: ConfigError) -> Self {
        FrontEndError::Config(err.to_string())
    }
}

impl From<TicketError> for FrontEndError {
    fn from(err: TicketError) -> Self {
        FrontEndError::Authentication(err.to_string())
    }
}

impl From<CorrelationError> for FrontEndError {
    fn from(err: CorrelationError) -> Self {
        FrontEndError::Authentication(err.to_string())
    }
}

impl From<ApiClientError> for FrontEndError {
    fn from(err: ApiClientError) -> Self {
        FrontEndError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<ProviderError> for FrontEndError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Remote { provider, error } => FrontEndError::ExternalProvider {
                provider,
                message: format!("remote error: {}", error),
            },
            ProviderError::TokenExchange { provider, message } => {
                FrontEndError::ExternalProvider { provider, message }
            }
            ProviderError::UserInfo { provider, message } => {
                FrontEndError::ExternalProvider { provider, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_conversion_keeps_provider() {
        let err: FrontEndError = ProviderError::TokenExchange {
            provider: "Google".to_string(),
            message: "invalid_grant".to_string(),
        }
        .into();

        match err {
            FrontEndError::ExternalProvider { provider, message } => {
                assert_eq!(provider, "Google");
                assert_eq!(message, "invalid_grant");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_correlation_error_wraps_ticket_error() {
        let err: CorrelationError = TicketError::Expired.into();
        assert_eq!(err, CorrelationError::Ticket(TicketError::Expired));
        assert!(FrontEndError::from(err).to_string().contains("expired"));
    }
}
