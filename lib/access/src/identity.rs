//! Resolved identities.
//!
//! An identity exists only for the duration of one request. It is rebuilt
//! from verified claims every time and never cached or stored.

use serde::Serialize;
use std::fmt;

use crate::error::IdentityError;
use crate::role::Role;

/// Which credential produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Custom token from the `token` cookie.
    CustomToken,
    /// Custom token from an `Authorization: Bearer` header.
    BearerToken,
    /// Federated session cookie.
    FederatedSession,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CustomToken => "custom_token",
            Self::BearerToken => "bearer_token",
            Self::FederatedSession => "federated_session",
        };
        f.write_str(name)
    }
}

/// A verified identity with a known role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    source: IdentitySource,
}

impl ResolvedIdentity {
    /// Creates an identity with a known role.
    #[must_use]
    pub fn new(role: Role, source: IdentitySource) -> Self {
        Self {
            role,
            subject_id: None,
            email: None,
            name: None,
            source,
        }
    }

    /// Builds an identity from verified claims.
    ///
    /// # Errors
    ///
    /// A missing or unrecognized role makes the claims unusable.
    pub fn from_claims(
        source: IdentitySource,
        role: Option<&str>,
        subject_id: Option<String>,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<Self, IdentityError> {
        let raw = role.ok_or(IdentityError::MissingRole)?;
        let role = raw.parse::<Role>().map_err(|_| IdentityError::UnknownRole {
            role: raw.to_string(),
        })?;

        Ok(Self {
            role,
            subject_id,
            email,
            name,
            source,
        })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> IdentitySource {
        self.source
    }
}
