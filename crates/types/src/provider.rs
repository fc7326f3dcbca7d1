//! External login provider kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported external login providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalProviderKind {
    Twitter,
    Google,
}

impl ExternalProviderKind {
    pub const ALL: [ExternalProviderKind; 2] = [ExternalProviderKind::Twitter, ExternalProviderKind::Google];

    /// Authentication scheme name
    pub fn scheme(&self) -> &'static str {
        match self {
            ExternalProviderKind::Twitter => "Twitter",
            ExternalProviderKind::Google => "Google",
        }
    }

    /// Label shown on the login page
    pub fn display_name(&self) -> &'static str {
        match self {
            ExternalProviderKind::Twitter => "Twitter",
            ExternalProviderKind::Google => "Google",
        }
    }

    /// Path the provider redirects back to after sign-in
    pub fn callback_path(&self) -> &'static str {
        match self {
            ExternalProviderKind::Twitter => "/signin-twitter",
            ExternalProviderKind::Google => "/signin-google",
        }
    }

    pub fn from_callback_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.callback_path() == path)
    }
}

impl fmt::Display for ExternalProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for ExternalProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.scheme().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown external provider: {}", s))
    }
}
