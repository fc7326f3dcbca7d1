//! Signed-in user identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known claim type names
pub mod claims {
    pub const NAME_IDENTIFIER: &str = "nameidentifier";
    pub const EMAIL: &str = "email";
    pub const DISPLAY_NAME: &str = "displayname";
}

/// Identity established by an external login provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User name evaluated by name-based policies
    pub name: String,
    /// Authentication scheme that produced this identity
    pub provider: String,
    /// Additional claims
    #[serde(default)]
    pub claims: BTreeMap<String, String>,
}

/// The user attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    User(Identity),
}

impl Identity {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            claims: BTreeMap::new(),
        }
    }

    /// Add a claim, replacing any previous value of the same type
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(claim_type.into(), value.into());
        self
    }

    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims.get(claim_type).map(String::as_str)
    }
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User(_))
    }

    /// User name, `None` for anonymous requests
    pub fn name(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User(identity) => Some(identity.name.as_str()),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Principal::Anonymous => None,
            Principal::User(identity) => Some(identity),
        }
    }
}

impl From<Identity> for Principal {
    fn from(identity: Identity) -> Self {
        Principal::User(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_principal() {
        let principal = Principal::default();
        assert!(!principal.is_authenticated());
        assert_eq!(principal.name(), None);
    }

    #[test]
    fn test_user_principal_exposes_name_and_claims() {
        let identity = Identity::new("jdoe", "Twitter").with_claim(claims::NAME_IDENTIFIER, "42");
        let principal = Principal::from(identity);

        assert!(principal.is_authenticated());
        assert_eq!(principal.name(), Some("jdoe"));
        assert_eq!(
            principal.identity().and_then(|i| i.claim(claims::NAME_IDENTIFIER)),
            Some("42")
        );
    }
}
