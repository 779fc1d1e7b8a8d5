//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `TokenError`: signing and verification of session credentials
//! - `IdentityError`: verified claims that do not describe a usable identity
//! - `PasswordError`: password hashing failures
//! - `RuleError`: protected prefixes that cannot be enforced

use std::fmt;

/// Errors from signing or verifying a session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret is configured.
    MissingSecret,
    /// The token's expiry has passed.
    Expired,
    /// The signature does not match the configured secret.
    InvalidSignature,
    /// The token header names an algorithm other than HS256.
    WrongAlgorithm,
    /// The token could not be parsed or its claims could not be decoded.
    Malformed { reason: String },
    /// Encoding a new token failed.
    Signing { reason: String },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSecret => write!(f, "no signing secret configured"),
            Self::Expired => write!(f, "token has expired"),
            Self::InvalidSignature => write!(f, "token signature is invalid"),
            Self::WrongAlgorithm => write!(f, "token uses an unexpected algorithm"),
            Self::Malformed { reason } => write!(f, "malformed token: {reason}"),
            Self::Signing { reason } => write!(f, "failed to sign token: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Errors from turning verified claims into an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The claims carry no `role`.
    MissingRole,
    /// The `role` claim is not a known role.
    UnknownRole { role: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRole => write!(f, "claims have no role"),
            Self::UnknownRole { role } => write!(f, "claims carry unknown role '{role}'"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Errors from password hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Hashing the password failed.
    Hash { reason: String },
    /// The stored hash is not a valid PHC string.
    InvalidHash { reason: String },
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash { reason } => write!(f, "failed to hash password: {reason}"),
            Self::InvalidHash { reason } => write!(f, "invalid password hash: {reason}"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Errors from building gate rules out of configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The prefix is not rooted at `/` or names no path segment.
    InvalidPrefix { prefix: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrefix { prefix } => write!(
                f,
                "protected prefix '{prefix}' must start with '/' and name a path segment"
            ),
        }
    }
}

impl std::error::Error for RuleError {}
