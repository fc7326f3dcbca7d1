//! HMAC-signed ticket payloads

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use types::{Identity, TicketError};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies serialized payloads.
///
/// Output format is `base64url(json).base64url(hmac)`. The purpose string is
/// part of the MAC input, so a value protected for one purpose never
/// verifies under another.
#[derive(Clone)]
pub struct TicketProtector {
    key: Vec<u8>,
}

impl std::fmt::Debug for TicketProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketProtector").field("key", &"<redacted>").finish()
    }
}

impl TicketProtector {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Protector with a random 256-bit key
    pub fn generate() -> Self {
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    pub fn protect<T: Serialize>(&self, purpose: &str, payload: &T) -> Result<String, TicketError> {
        let json = serde_json::to_vec(payload).map_err(|e| TicketError::Payload(e.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(purpose, &encoded)?;
        Ok(format!("{}.{}", encoded, signature))
    }

    pub fn unprotect<T: DeserializeOwned>(&self, purpose: &str, value: &str) -> Result<T, TicketError> {
        let (encoded, signature) = value.split_once('.').ok_or(TicketError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TicketError::Malformed)?;

        let mut mac = self.mac(purpose)?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TicketError::SignatureInvalid)?;

        let json = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| TicketError::Malformed)?;
        serde_json::from_slice(&json).map_err(|e| TicketError::Payload(e.to_string()))
    }

    fn sign(&self, purpose: &str, encoded: &str) -> Result<String, TicketError> {
        let mut mac = self.mac(purpose)?;
        mac.update(encoded.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    fn mac(&self, purpose: &str) -> Result<HmacSha256, TicketError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TicketError::InvalidKey)?;
        mac.update(purpose.as_bytes());
        mac.update(b".");
        Ok(mac)
    }
}

/// Authenticated session carried in the auth cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationTicket {
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticationTicket {
    pub fn new(identity: Identity, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            identity,
            issued_at,
            expires_at: issued_at + lifetime,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// More time has elapsed since issue than remains before expiry
    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now - self.issued_at;
        let remaining = self.expires_at - now;
        elapsed > remaining
    }

    /// Same identity and lifetime, re-issued at `now`
    pub fn renewed(&self, now: DateTime<Utc>) -> Self {
        Self::new(self.identity.clone(), now, self.expires_at - self.issued_at)
    }
}
