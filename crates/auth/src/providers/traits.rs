//! External login provider traits and interfaces

use async_trait::async_trait;
use types::{claims, ExternalProviderKind, Identity, ProviderError};
use url::Url;

/// User returned by an external provider after a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalUser {
    /// Provider that authenticated the user
    pub provider: ExternalProviderKind,
    /// Stable provider-side identifier
    pub id: String,
    /// Name used for the local identity
    pub name: String,
    /// Display name, if the provider exposes one
    pub display_name: Option<String>,
    /// Email address, if the provider exposes one
    pub email: Option<String>,
}

impl ExternalUser {
    /// Map into the identity stored in the auth cookie
    pub fn into_identity(self) -> Identity {
        let mut identity = Identity::new(self.name, self.provider.scheme())
            .with_claim(claims::NAME_IDENTIFIER, self.id);
        if let Some(email) = self.email {
            identity = identity.with_claim(claims::EMAIL, email);
        }
        if let Some(display_name) = self.display_name {
            identity = identity.with_claim(claims::DISPLAY_NAME, display_name);
        }
        identity
    }
}

/// Trait for OAuth-style external login providers
#[async_trait]
pub trait ExternalLoginProvider: Send + Sync {
    /// Which provider this is
    fn kind(&self) -> ExternalProviderKind;

    /// URL the browser is sent to in order to sign in
    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError>;

    /// Trade the authorization code from the callback for the signed-in user
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<ExternalUser, ProviderError>;
}
