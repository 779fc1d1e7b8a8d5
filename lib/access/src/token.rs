//! The custom session token minted at password login.
//!
//! The token is an HS256 JWT carried in the `token` cookie with the claims
//! `{id, role, email, iat, exp}`. Every claim other than `exp` is optional
//! on the decode side so that a verified token with a missing role reaches
//! identity resolution and is rejected there, instead of failing inside
//! the JWT library with an opaque error.

use anaya_candles_core::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, TokenError};
use crate::identity::{IdentitySource, ResolvedIdentity};
use crate::jwt::JwtCodec;
use crate::user::User;

/// Cookie carrying the custom token.
pub const TOKEN_COOKIE: &str = "token";

/// Validity of a freshly minted custom token.
pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Claims of the custom token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomClaims {
    /// Subject user ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl CustomClaims {
    /// Builds the claims for a user, valid for `lifetime` from now.
    #[must_use]
    pub fn for_user(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Some(user.id().to_string()),
            role: Some(user.role().as_str().to_string()),
            email: Some(user.email().to_string()),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// Converts verified claims into an identity.
    pub fn into_identity(
        self,
        source: IdentitySource,
    ) -> std::result::Result<ResolvedIdentity, IdentityError> {
        ResolvedIdentity::from_claims(source, self.role.as_deref(), self.id, self.email, None)
    }
}

/// Mints custom tokens on successful password login.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: JwtCodec,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Creates an issuer with the default seven-day lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingSecret` if the secret is empty.
    pub fn new(secret: &str) -> std::result::Result<Self, TokenError> {
        Ok(Self {
            codec: JwtCodec::new(secret)?,
            lifetime: Duration::days(DEFAULT_TOKEN_LIFETIME_DAYS),
        })
    }

    /// Overrides the token lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Returns how long minted tokens stay valid.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mints a token for the given user.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_claims(&CustomClaims::for_user(user, self.lifetime))
    }

    /// Signs an explicit claim set.
    pub fn issue_claims(&self, claims: &CustomClaims) -> Result<String, TokenError> {
        let token = self.codec.sign(claims)?;
        tracing::debug!(subject = ?claims.id, role = ?claims.role, "issued custom token");
        Ok(token)
    }
}
