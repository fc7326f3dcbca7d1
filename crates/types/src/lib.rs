//! Shared types for the conference planner front end
//!
//! This crate contains the error taxonomy, identity model and small helpers
//! used across the front end components.

pub mod error;
pub mod health;
pub mod identity;
pub mod provider;
pub mod utils;

// Re-export commonly used types
pub use error::{
    ApiClientError, ConfigError, CorrelationError, FrontEndError, ProviderError, Result, TicketError,
};
pub use health::{BackendHealth, HealthStatus};
pub use identity::{claims, Identity, Principal};
pub use provider::ExternalProviderKind;
