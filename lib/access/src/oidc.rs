//! OpenID Connect configuration for federated login.
//!
//! Federated login is optional. When configured, the storefront delegates
//! authentication to an external provider (e.g. Google) and mints its own
//! federated session from the returned profile.

use serde::{Deserialize, Serialize};

/// Configuration for the external OIDC identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL used for discovery (e.g. "https://accounts.google.com").
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The callback URL (e.g. "https://anayacandles.com/auth/federated/callback").
    redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

impl OidcConfig {
    /// Creates a new OIDC configuration with the default scopes.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
        }
    }

    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the OAuth2 scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Profile returned by the identity provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    /// The subject claim (unique user identifier at the provider).
    pub subject: String,
    /// The issuer URL.
    pub issuer: String,
    /// Email address, required to sign in.
    pub email: Option<String>,
    /// The provider's `email_verified` claim.
    pub email_verified: Option<bool>,
    /// Display name (from name or preferred_username).
    pub display_name: Option<String>,
}

impl FederatedProfile {
    /// Returns the email if the profile is allowed to sign in.
    ///
    /// Accounts are matched by email, so only an email the provider has
    /// verified is accepted. Profiles without one are refused.
    #[must_use]
    pub fn sign_in_email(&self) -> Option<&str> {
        if self.email_verified != Some(true) {
            return None;
        }
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Display name for a newly created account.
    #[must_use]
    pub fn account_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}
