//! The request gate.
//!
//! The gate maps a request path and its credentials to one of three
//! decisions. Paths outside every protected prefix are forwarded without
//! looking at credentials at all. For protected paths the resolver chain
//! runs once; no identity means login, an identity without the required
//! role means unauthorized.

use serde::{Deserialize, Serialize};

use crate::credentials::RequestCredentials;
use crate::error::RuleError;
use crate::resolver::ResolverChain;

/// What a protected prefix demands of the resolved identity.
///
/// Ordered from weakest to strongest; when several prefixes match a path
/// the strongest requirement applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Any verified identity.
    Authenticated,
    /// An identity whose role is exactly `admin`.
    Admin,
}

/// A protected URL path prefix.
///
/// Deserialized rules go through [`ProtectedPrefix::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPrefix")]
pub struct ProtectedPrefix {
    prefix: String,
    requirement: Requirement,
}

#[derive(Deserialize)]
struct RawPrefix {
    prefix: String,
    requirement: Requirement,
}

impl TryFrom<RawPrefix> for ProtectedPrefix {
    type Error = RuleError;

    fn try_from(raw: RawPrefix) -> Result<Self, Self::Error> {
        Self::parse(raw.prefix, raw.requirement)
    }
}

impl ProtectedPrefix {
    /// Creates a protected prefix from a known-good literal. Trailing slashes are ignored.
    ///
    /// Use [`ProtectedPrefix::parse`] for prefixes that come from configuration.
    #[must_use]
    pub fn new(prefix: impl Into<String>, requirement: Requirement) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            requirement,
        }
    }

    /// Creates a protected prefix, rejecting ones that would never match or
    /// would match every path.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidPrefix` unless the prefix starts with `/`
    /// and names at least one path segment.
    pub fn parse(prefix: impl Into<String>, requirement: Requirement) -> Result<Self, RuleError> {
        let prefix: String = prefix.into();
        let trimmed = prefix.trim().trim_end_matches('/');
        if !trimmed.starts_with('/') {
            return Err(RuleError::InvalidPrefix { prefix });
        }
        Ok(Self::new(trimmed, requirement))
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Returns true if `path` is the prefix itself or lies beneath it.
    ///
    /// Matching is segment-aware: `/admin` covers `/admin/products` but not
    /// `/administrator`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// The default protected prefixes: `/admin` for admins, `/user` for anyone signed in.
#[must_use]
pub fn default_rules() -> Vec<ProtectedPrefix> {
    vec![
        ProtectedPrefix::new("/admin", Requirement::Admin),
        ProtectedPrefix::new("/user", Requirement::Authenticated),
    ]
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unchanged.
    Forward,
    /// No verified identity; send the client to the login page.
    RedirectToLogin,
    /// Verified identity lacking the required role.
    RedirectToUnauthorized,
}

/// Decides, per request, whether a protected path may be reached.
#[derive(Debug)]
pub struct Gate {
    rules: Vec<ProtectedPrefix>,
    resolvers: ResolverChain,
}

impl Gate {
    #[must_use]
    pub fn new(rules: Vec<ProtectedPrefix>, resolvers: ResolverChain) -> Self {
        Self { rules, resolvers }
    }

    /// Gate over `/admin` and `/user`.
    #[must_use]
    pub fn with_default_rules(resolvers: ResolverChain) -> Self {
        Self::new(default_rules(), resolvers)
    }

    #[must_use]
    pub fn rules(&self) -> &[ProtectedPrefix] {
        &self.rules
    }

    /// Returns the requirement for a path, or `None` if the path is not protected.
    #[must_use]
    pub fn requirement_for(&self, path: &str) -> Option<Requirement> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .map(ProtectedPrefix::requirement)
            .max()
    }

    /// Decides what to do with a request.
    pub fn check(&self, path: &str, credentials: &RequestCredentials) -> GateDecision {
        let Some(requirement) = self.requirement_for(path) else {
            return GateDecision::Forward;
        };

        let Some(identity) = self.resolvers.resolve(credentials) else {
            tracing::debug!(path, "no verified identity for protected path");
            return GateDecision::RedirectToLogin;
        };

        if requirement == Requirement::Admin && !identity.is_admin() {
            tracing::warn!(
                path,
                role = %identity.role(),
                source = %identity.source(),
                subject = identity.subject_id().unwrap_or("-"),
                "admin path requested without admin role"
            );
            return GateDecision::RedirectToUnauthorized;
        }

        GateDecision::Forward
    }
}
