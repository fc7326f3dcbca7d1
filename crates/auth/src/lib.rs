//! Cookie authentication, authorization policies and external login providers
//!
//! Identities come from an external OAuth provider, are carried between
//! requests in an HMAC-signed cookie, and are checked against named
//! authorization policies bound to protected folders.

pub mod cookie_auth;
pub mod cookies;
pub mod policy;
pub mod providers;
pub mod ticket;

pub use cookie_auth::{AuthenticateResult, CookieAuthOptions, CookieAuthentication};
pub use cookies::{get_cookie, parse_cookie_header, SameSite, SetCookie};
pub use policy::{AuthorizationPolicy, PolicyOutcome, PolicyRegistry, Requirement, ADMIN_POLICY};
pub use providers::*;
pub use ticket::{AuthenticationTicket, TicketProtector};
