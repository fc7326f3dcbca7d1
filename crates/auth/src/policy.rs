//! Named authorization policies and protected folders

use std::collections::HashMap;
use types::{FrontEndError, Principal, Result};

/// Name of the policy guarding the admin folder
pub const ADMIN_POLICY: &str = "Admin";

/// Folder protected by [`ADMIN_POLICY`]
pub const ADMIN_FOLDER: &str = "/admin";

/// A single condition a principal must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in user
    AuthenticatedUser,
    /// Signed-in user with exactly this name (ordinal comparison)
    UserName(String),
    /// Signed-in user carrying a claim with one of the allowed values
    Claim {
        claim_type: String,
        allowed_values: Vec<String>,
    },
}

impl Requirement {
    pub fn is_satisfied(&self, principal: &Principal) -> bool {
        match (self, principal.identity()) {
            (_, None) => false,
            (Requirement::AuthenticatedUser, Some(_)) => true,
            (Requirement::UserName(required), Some(identity)) => identity.name == *required,
            (
                Requirement::Claim {
                    claim_type,
                    allowed_values,
                },
                Some(identity),
            ) => match identity.claim(claim_type) {
                Some(value) => allowed_values.is_empty() || allowed_values.iter().any(|v| v == value),
                None => false,
            },
        }
    }
}

/// Result of evaluating a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    Allowed,
    /// Anonymous user; send to the login page
    Challenge,
    /// Signed-in user who fails the policy; send to the access denied page
    Forbid,
}

/// A named set of requirements, all of which must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    name: String,
    requirements: Vec<Requirement>,
}

impl AuthorizationPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
        }
    }

    pub fn require_authenticated_user(mut self) -> Self {
        self.requirements.push(Requirement::AuthenticatedUser);
        self
    }

    pub fn require_user_name(mut self, name: impl Into<String>) -> Self {
        self.requirements.push(Requirement::UserName(name.into()));
        self
    }

    pub fn require_claim<I, S>(mut self, claim_type: impl Into<String>, allowed_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.push(Requirement::Claim {
            claim_type: claim_type.into(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn evaluate(&self, principal: &Principal) -> PolicyOutcome {
        if self.requirements.iter().all(|r| r.is_satisfied(principal)) {
            PolicyOutcome::Allowed
        } else if principal.is_authenticated() {
            PolicyOutcome::Forbid
        } else {
            PolicyOutcome::Challenge
        }
    }
}

#[derive(Debug, Clone)]
struct FolderRule {
    folder: String,
    policy: String,
}

/// Registered policies and the folders they protect
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, AuthorizationPolicy>,
    folders: Vec<FolderRule>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Admin` policy (signed in as `admin`) protecting `/admin`
    pub fn for_admin(admin: &str) -> Self {
        let mut registry = Self::new();
        registry.add_policy(
            AuthorizationPolicy::new(ADMIN_POLICY)
                .require_authenticated_user()
                .require_user_name(admin),
        );
        registry.folders.push(FolderRule {
            folder: ADMIN_FOLDER.to_string(),
            policy: ADMIN_POLICY.to_string(),
        });
        registry
    }

    pub fn add_policy(&mut self, policy: AuthorizationPolicy) {
        self.policies.insert(policy.name.clone(), policy);
    }

    pub fn policy(&self, name: &str) -> Option<&AuthorizationPolicy> {
        self.policies.get(name)
    }

    /// Protect `folder` and everything below it with the named policy
    pub fn authorize_folder(&mut self, folder: &str, policy: &str) -> Result<()> {
        if !self.policies.contains_key(policy) {
            return Err(FrontEndError::Authorization(format!(
                "The authorization policy named '{}' was not found",
                policy
            )));
        }

        if !folder.starts_with('/') {
            return Err(FrontEndError::Authorization(format!(
                "Folder path must start with '/': {}",
                folder
            )));
        }

        self.folders.push(FolderRule {
            folder: folder.trim_end_matches('/').to_string(),
            policy: policy.to_string(),
        });
        Ok(())
    }

    /// Policy guarding `path`, if any. The most specific folder wins.
    pub fn policy_for_path(&self, path: &str) -> Option<&AuthorizationPolicy> {
        let decoded = urlencoding::decode(path).ok();
        let path = decoded.as_deref().unwrap_or(path);

        self.folders
            .iter()
            .filter(|rule| folder_contains(&rule.folder, path))
            .max_by_key(|rule| rule.folder.len())
            .and_then(|rule| self.policies.get(&rule.policy))
    }

    /// Evaluate the folder policy for `path`; unprotected paths are allowed
    pub fn authorize_path(&self, path: &str, principal: &Principal) -> PolicyOutcome {
        match self.policy_for_path(path) {
            Some(policy) => policy.evaluate(principal),
            None => PolicyOutcome::Allowed,
        }
    }
}

fn folder_contains(folder: &str, path: &str) -> bool {
    // An empty folder is the site root
    if folder.is_empty() {
        return true;
    }

    match path.get(..folder.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(folder) => {
            matches!(path.as_bytes().get(folder.len()), None | Some(b'/'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{claims, Identity};

    fn user(name: &str) -> Principal {
        Principal::User(Identity::new(name, "Twitter"))
    }

    #[test]
    fn test_admin_policy_outcomes() {
        let registry = PolicyRegistry::for_admin("jdoe");
        let policy = registry.policy(ADMIN_POLICY).unwrap();

        assert_eq!(policy.evaluate(&Principal::Anonymous), PolicyOutcome::Challenge);
        assert_eq!(policy.evaluate(&user("someone")), PolicyOutcome::Forbid);
        assert_eq!(policy.evaluate(&user("jdoe")), PolicyOutcome::Allowed);
    }

    #[test]
    fn test_user_name_comparison_is_ordinal() {
        let policy = AuthorizationPolicy::new("Exact").require_user_name("JDoe");
        assert_eq!(policy.evaluate(&user("jdoe")), PolicyOutcome::Forbid);
        assert_eq!(policy.evaluate(&user("JDoe")), PolicyOutcome::Allowed);
    }

    #[test]
    fn test_user_name_requirement_ignores_provider() {
        let registry = PolicyRegistry::for_admin("jdoe");
        let policy = registry.policy(ADMIN_POLICY).unwrap();

        let twitter = Principal::User(Identity::new("jdoe", "Twitter"));
        let google = Principal::User(Identity::new("jdoe", "Google"));
        assert_eq!(policy.evaluate(&twitter), PolicyOutcome::Allowed);
        assert_eq!(policy.evaluate(&google), PolicyOutcome::Allowed);
    }

    #[test]
    fn test_claim_requirement() {
        let policy = AuthorizationPolicy::new("Verified").require_claim(claims::EMAIL, ["a@example.org"]);
        let with_claim = Principal::User(Identity::new("a", "Google").with_claim(claims::EMAIL, "a@example.org"));
        let other_claim = Principal::User(Identity::new("b", "Google").with_claim(claims::EMAIL, "b@example.org"));

        assert_eq!(policy.evaluate(&with_claim), PolicyOutcome::Allowed);
        assert_eq!(policy.evaluate(&other_claim), PolicyOutcome::Forbid);
        assert_eq!(policy.evaluate(&user("c")), PolicyOutcome::Forbid);

        let any_value = AuthorizationPolicy::new("HasEmail").require_claim(claims::EMAIL, Vec::<String>::new());
        assert_eq!(any_value.evaluate(&other_claim), PolicyOutcome::Allowed);
    }

    #[test]
    fn test_admin_folder_matching() {
        let registry = PolicyRegistry::for_admin("jdoe");

        for path in ["/admin", "/admin/", "/Admin/backend", "/ADMIN/x/y", "/%61dmin/backend"] {
            assert!(registry.policy_for_path(path).is_some(), "{path} should be protected");
        }
        for path in ["/", "/administrator", "/Home/Index", "/Login", "/adm"] {
            assert!(registry.policy_for_path(path).is_none(), "{path} should be open");
        }
    }

    #[test]
    fn test_authorize_path() {
        let registry = PolicyRegistry::for_admin("jdoe");
        assert_eq!(registry.authorize_path("/Home", &Principal::Anonymous), PolicyOutcome::Allowed);
        assert_eq!(registry.authorize_path("/admin", &Principal::Anonymous), PolicyOutcome::Challenge);
        assert_eq!(registry.authorize_path("/admin", &user("eve")), PolicyOutcome::Forbid);
        assert_eq!(registry.authorize_path("/admin", &user("jdoe")), PolicyOutcome::Allowed);
    }

    #[test]
    fn test_authorize_folder_requires_known_policy() {
        let mut registry = PolicyRegistry::for_admin("jdoe");
        assert!(registry.authorize_folder("/speakers", "Missing").is_err());
        assert!(registry.authorize_folder("speakers", ADMIN_POLICY).is_err());

        registry.add_policy(AuthorizationPolicy::new("Signed").require_authenticated_user());
        registry.authorize_folder("/admin/reports/", "Signed").unwrap();

        // Most specific folder wins
        assert_eq!(registry.policy_for_path("/admin/reports/daily").unwrap().name(), "Signed");
        assert_eq!(registry.policy_for_path("/admin/backend").unwrap().name(), ADMIN_POLICY);
    }
}
