//! OAuth correlation state and PKCE helpers

use crate::cookies::{SameSite, SetCookie};
use crate::ticket::TicketProtector;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::{CorrelationError, ExternalProviderKind, TicketError};

const CORRELATION_PURPOSE: &str = "FrontEnd.Auth.Correlation";

/// How long a started sign-in may take before the callback is rejected
pub const CORRELATION_LIFETIME_MINUTES: i64 = 15;

/// Random URL-safe token with `bytes` bytes of entropy
pub fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// PKCE S256 challenge for a verifier
pub fn pkce_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Fresh PKCE verifier and its S256 challenge
pub fn pkce_pair() -> (String, String) {
    let verifier = random_token(32);
    let challenge = pkce_challenge(&verifier);
    (verifier, challenge)
}

pub fn correlation_cookie_name(provider: ExternalProviderKind) -> String {
    format!(".FrontEnd.Correlation.{}", provider.scheme())
}

/// State of a sign-in that was sent to an external provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationState {
    pub provider: ExternalProviderKind,
    pub state: String,
    pub code_verifier: String,
    pub return_url: String,
    pub expires_at: DateTime<Utc>,
}

impl CorrelationState {
    pub fn new(provider: ExternalProviderKind, return_url: impl Into<String>) -> Self {
        Self::new_at(provider, return_url, Utc::now())
    }

    pub fn new_at(provider: ExternalProviderKind, return_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        let (code_verifier, _) = pkce_pair();
        Self {
            provider,
            state: random_token(32),
            code_verifier,
            return_url: return_url.into(),
            expires_at: now + Duration::minutes(CORRELATION_LIFETIME_MINUTES),
        }
    }

    pub fn code_challenge(&self) -> String {
        pkce_challenge(&self.code_verifier)
    }

    /// Signed cookie carrying this state to the callback
    pub fn to_cookie(&self, protector: &TicketProtector, secure: bool) -> Result<SetCookie, TicketError> {
        let value = protector.protect(CORRELATION_PURPOSE, self)?;
        Ok(SetCookie::new(correlation_cookie_name(self.provider), value)
            .max_age(CORRELATION_LIFETIME_MINUTES * 60)
            .secure(secure)
            .same_site(SameSite::Lax))
    }

    /// Cookie that clears the correlation once the callback completes
    pub fn removal_cookie(provider: ExternalProviderKind, secure: bool) -> SetCookie {
        SetCookie::removal(correlation_cookie_name(provider)).secure(secure)
    }

    /// Check the callback's `state` against the correlation cookie
    pub fn verify(
        protector: &TicketProtector,
        provider: ExternalProviderKind,
        cookie_value: Option<&str>,
        returned_state: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CorrelationState, CorrelationError> {
        let cookie_value = cookie_value.ok_or_else(|| CorrelationError::MissingCookie {
            provider: provider.scheme().to_string(),
        })?;

        let correlation: CorrelationState = protector.unprotect(CORRELATION_PURPOSE, cookie_value)?;

        if now >= correlation.expires_at {
            return Err(TicketError::Expired.into());
        }

        let state_matches = correlation.provider == provider
            && returned_state.is_some_and(|s| constant_time_eq(s.as_bytes(), correlation.state.as_bytes()));
        if !state_matches {
            return Err(CorrelationError::StateMismatch {
                provider: provider.scheme().to_string(),
            });
        }

        Ok(correlation)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
