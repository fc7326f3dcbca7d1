//! External login providers
//!
//! Twitter and Google are registered only when their client identifier is
//! configured. Each provider runs the authorization-code flow with PKCE and
//! carries its round-trip state in a signed correlation cookie.

pub mod correlation;
pub mod oauth;
pub mod traits;

pub use correlation::{correlation_cookie_name, pkce_challenge, pkce_pair, random_token, CorrelationState};
pub use oauth::{OAuthEndpoints, OAuthProvider};
pub use traits::{ExternalLoginProvider, ExternalUser};

use config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use types::{ExternalProviderKind, Result};

/// Registered external login providers
#[derive(Clone, Default)]
pub struct ExternalProviders {
    providers: HashMap<ExternalProviderKind, Arc<dyn ExternalLoginProvider>>,
}

impl std::fmt::Debug for ExternalProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalProviders").field("kinds", &self.kinds()).finish()
    }
}

impl ExternalProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register each provider whose client identifier is configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut providers = Self::new();

        if let Some(credentials) = config.twitter() {
            providers.register(Arc::new(OAuthProvider::twitter(credentials)?));
        }
        if let Some(credentials) = config.google() {
            providers.register(Arc::new(OAuthProvider::google(credentials)?));
        }

        tracing::info!(providers = ?providers.kinds(), "External login providers configured");
        Ok(providers)
    }

    pub fn register(&mut self, provider: Arc<dyn ExternalLoginProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ExternalProviderKind) -> Option<Arc<dyn ExternalLoginProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Registered kinds in display order
    pub fn kinds(&self) -> Vec<ExternalProviderKind> {
        ExternalProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
