//! Cookie authentication scheme

use crate::cookies::{get_cookie, SameSite, SetCookie};
use crate::ticket::{AuthenticationTicket, TicketProtector};
use chrono::{DateTime, Duration, Utc};
use config::Config;
use tracing::{debug, warn};
use types::{Identity, Principal, TicketError};

const SESSION_PURPOSE: &str = "FrontEnd.Auth.Session";

/// Query parameter carrying the page to return to after sign-in
pub const RETURN_URL_PARAMETER: &str = "ReturnUrl";

/// Cookie authentication options
#[derive(Debug, Clone)]
pub struct CookieAuthOptions {
    pub cookie_name: String,
    pub login_path: String,
    pub access_denied_path: String,
    pub logout_path: String,
    pub expire: Duration,
    pub sliding_expiration: bool,
    pub secure: bool,
}

impl CookieAuthOptions {
    pub fn from_config(config: &Config) -> Self {
        let auth = &config.authentication;
        Self {
            cookie_name: auth.cookie_name.clone(),
            login_path: auth.login_path.clone(),
            access_denied_path: auth.access_denied_path.clone(),
            logout_path: auth.logout_path.clone(),
            expire: Duration::minutes(auth.expire_minutes as i64),
            sliding_expiration: auth.sliding_expiration,
            secure: config.secure_cookies(),
        }
    }
}

impl Default for CookieAuthOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of reading the auth cookie from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticateResult {
    pub principal: Principal,
    /// Replacement cookie when the sliding window elapsed past its midpoint
    pub renewal: Option<SetCookie>,
}

/// Issues and reads the signed auth cookie
#[derive(Debug, Clone)]
pub struct CookieAuthentication {
    options: CookieAuthOptions,
    protector: TicketProtector,
}

impl CookieAuthentication {
    pub fn new(options: CookieAuthOptions, protector: TicketProtector) -> Self {
        Self { options, protector }
    }

    /// Build from configuration, generating a per-process key when no secret is set
    pub fn from_config(config: &Config) -> Self {
        let protector = match config.authentication.secret {
            Some(ref secret) => TicketProtector::new(secret.as_bytes().to_vec()),
            None => {
                warn!("No cookie secret configured; using a random key, sessions end on restart");
                TicketProtector::generate()
            }
        };

        Self::new(CookieAuthOptions::from_config(config), protector)
    }

    pub fn options(&self) -> &CookieAuthOptions {
        &self.options
    }

    pub fn protector(&self) -> &TicketProtector {
        &self.protector
    }

    /// Issue an auth cookie for `identity`
    pub fn sign_in(&self, identity: Identity) -> Result<SetCookie, TicketError> {
        self.sign_in_at(identity, Utc::now())
    }

    pub fn sign_in_at(&self, identity: Identity, now: DateTime<Utc>) -> Result<SetCookie, TicketError> {
        let ticket = AuthenticationTicket::new(identity, now, self.options.expire);
        self.ticket_cookie(&ticket)
    }

    /// Cookie that removes the session
    pub fn sign_out(&self) -> SetCookie {
        SetCookie::removal(&self.options.cookie_name).secure(self.options.secure)
    }

    /// Resolve the principal from a `Cookie` header
    pub fn authenticate(&self, cookie_header: Option<&str>) -> AuthenticateResult {
        self.authenticate_at(cookie_header, Utc::now())
    }

    pub fn authenticate_at(&self, cookie_header: Option<&str>, now: DateTime<Utc>) -> AuthenticateResult {
        let anonymous = AuthenticateResult {
            principal: Principal::Anonymous,
            renewal: None,
        };

        let Some(value) = cookie_header.and_then(|h| get_cookie(h, &self.options.cookie_name)) else {
            return anonymous;
        };

        let ticket = match self.read_ticket(value, now) {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!(cookie = %self.options.cookie_name, error = %e, "Auth cookie rejected");
                return anonymous;
            }
        };

        let renewal = if self.options.sliding_expiration && ticket.needs_renewal(now) {
            match self.ticket_cookie(&ticket.renewed(now)) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    warn!(error = %e, "Failed to renew auth cookie");
                    None
                }
            }
        } else {
            None
        };

        AuthenticateResult {
            principal: Principal::User(ticket.identity),
            renewal,
        }
    }

    /// Login page location for an anonymous request to `return_url`
    pub fn challenge_location(&self, return_url: &str) -> String {
        with_return_url(&self.options.login_path, return_url)
    }

    /// Access denied location for an unauthorized request to `return_url`
    pub fn forbid_location(&self, return_url: &str) -> String {
        with_return_url(&self.options.access_denied_path, return_url)
    }

    fn read_ticket(&self, value: &str, now: DateTime<Utc>) -> Result<AuthenticationTicket, TicketError> {
        let ticket: AuthenticationTicket = self.protector.unprotect(SESSION_PURPOSE, value)?;
        if ticket.is_expired(now) {
            return Err(TicketError::Expired);
        }
        Ok(ticket)
    }

    fn ticket_cookie(&self, ticket: &AuthenticationTicket) -> Result<SetCookie, TicketError> {
        let value = self.protector.protect(SESSION_PURPOSE, ticket)?;
        Ok(SetCookie::new(&self.options.cookie_name, value)
            .max_age(self.options.expire.num_seconds())
            .secure(self.options.secure)
            .same_site(SameSite::Lax))
    }
}

fn with_return_url(path: &str, return_url: &str) -> String {
    format!("{}?{}={}", path, RETURN_URL_PARAMETER, urlencoding::encode(return_url))
}
