//! The federated session minted after an external OpenID Connect login.
//!
//! The federated subsystem signs its sessions with its own secret and keeps
//! them in a separate cookie, so neither issuer depends on the other's token
//! shape. The role is looked up from the user store when the session is
//! minted.

use anaya_candles_core::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, TokenError};
use crate::identity::{IdentitySource, ResolvedIdentity};
use crate::jwt::JwtCodec;
use crate::user::User;

/// Cookie carrying the federated session.
pub const FEDERATED_SESSION_COOKIE: &str = "federated_session";

/// Validity of a freshly minted federated session.
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 30;

/// Claims of a federated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedClaims {
    /// Subject at the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Storefront user ID, copied from the user record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl FederatedClaims {
    /// Converts verified claims into an identity.
    pub fn into_identity(self) -> std::result::Result<ResolvedIdentity, IdentityError> {
        ResolvedIdentity::from_claims(
            IdentitySource::FederatedSession,
            self.role.as_deref(),
            self.id,
            self.email,
            self.name,
        )
    }
}

/// Mints and verifies federated sessions.
#[derive(Debug, Clone)]
pub struct FederatedSessions {
    codec: JwtCodec,
    lifetime: Duration,
}

impl FederatedSessions {
    /// Creates the session codec with the default thirty-day lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingSecret` if the secret is empty.
    pub fn new(secret: &str) -> std::result::Result<Self, TokenError> {
        Ok(Self {
            codec: JwtCodec::new(secret)?,
            lifetime: Duration::days(DEFAULT_SESSION_LIFETIME_DAYS),
        })
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mints a session for a provider subject mapped to a storefront user.
    pub fn mint(&self, subject: &str, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = FederatedClaims {
            sub: Some(subject.to_string()),
            email: Some(user.email().to_string()),
            name: Some(user.name().to_string()),
            id: Some(user.id().to_string()),
            role: Some(user.role().as_str().to_string()),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        self.mint_claims(&claims)
    }

    /// Signs an explicit claim set.
    pub fn mint_claims(&self, claims: &FederatedClaims) -> Result<String, TokenError> {
        Ok(self.codec.sign(claims)?)
    }

    /// Verifies a session token and returns its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<FederatedClaims, TokenError> {
        self.codec.verify(token)
    }
}
