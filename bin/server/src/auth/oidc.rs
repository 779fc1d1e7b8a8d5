//! Federated login against an OpenID Connect provider.

use anaya_candles_access::{FederatedProfile, OidcConfig};
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreIdTokenClaims, CoreProviderMetadata,
};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse,
};
use std::fmt;

/// Client as configured from discovered metadata: authorization endpoint
/// known, token and userinfo endpoints as advertised by the provider.
type ProviderClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// Talks to the configured identity provider.
pub struct OidcClient {
    client: ProviderClient,
    scopes: Vec<Scope>,
    http_client: reqwest::Client,
}

/// Per-attempt secrets kept by the browser between login and callback.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

impl OidcClient {
    /// Fetches the provider's discovery document and builds a client.
    pub async fn discover(config: OidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::config("issuer URL", e))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::config("redirect URI", e))?;

        // The provider must not be able to bounce us to arbitrary hosts.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| OidcError::config("HTTP client", e))?;

        let metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery {
                reason: e.to_string(),
            })?;

        let client = CoreClient::from_provider_metadata(
            metadata,
            ClientId::new(config.client_id().to_string()),
            Some(ClientSecret::new(config.client_secret().to_string())),
        )
        .set_redirect_uri(redirect_url);

        let scopes = config
            .scopes()
            .into_iter()
            .filter(|s| *s != "openid")
            .map(|s| Scope::new(s.to_string()))
            .collect();

        tracing::info!(issuer = config.issuer_url(), "OIDC provider discovered");
        Ok(Self {
            client,
            scopes,
            http_client,
        })
    }

    /// Builds the provider URL to send the browser to, with fresh CSRF, PKCE and nonce values.
    pub fn authorization_url(&self) -> (String, AuthState) {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_token, nonce) = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scopes(self.scopes.iter().cloned())
            .set_pkce_challenge(challenge)
            .url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };
        (url.to_string(), state)
    }

    /// Redeems an authorization code and returns the verified profile from the ID token.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<FederatedProfile, OidcError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(OidcError::exchange)?
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(OidcError::exchange)?;

        let id_token = response.id_token().ok_or(OidcError::MissingIdToken)?;
        let claims = id_token
            .claims(
                &self.client.id_token_verifier(),
                &Nonce::new(state.nonce.clone()),
            )
            .map_err(|e| OidcError::InvalidIdToken {
                reason: e.to_string(),
            })?;

        Ok(profile_from(claims))
    }
}

fn profile_from(claims: &CoreIdTokenClaims) -> FederatedProfile {
    let display_name = claims
        .name()
        .and_then(|name| name.get(None))
        .map(|name| name.as_str().to_string())
        .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()));

    FederatedProfile {
        subject: claims.subject().to_string(),
        issuer: claims.issuer().to_string(),
        email: claims.email().map(|e| e.as_str().to_string()),
        email_verified: claims.email_verified(),
        display_name,
    }
}

/// Failures talking to the identity provider.
#[derive(Debug)]
pub enum OidcError {
    /// A configured value could not be used.
    Config { what: &'static str, reason: String },
    /// The discovery document could not be fetched or parsed.
    Discovery { reason: String },
    /// The token endpoint refused or could not be reached.
    Exchange { reason: String },
    /// The token response carried no ID token.
    MissingIdToken,
    /// The ID token failed signature, audience, expiry or nonce checks.
    InvalidIdToken { reason: String },
}

impl OidcError {
    fn config(what: &'static str, err: impl fmt::Display) -> Self {
        Self::Config {
            what,
            reason: err.to_string(),
        }
    }

    fn exchange(err: impl fmt::Display) -> Self {
        Self::Exchange {
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for OidcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { what, reason } => write!(f, "invalid OIDC {}: {}", what, reason),
            Self::Discovery { reason } => write!(f, "OIDC discovery failed: {}", reason),
            Self::Exchange { reason } => write!(f, "OIDC code exchange failed: {}", reason),
            Self::MissingIdToken => f.write_str("OIDC token response has no ID token"),
            Self::InvalidIdToken { reason } => write!(f, "OIDC ID token rejected: {}", reason),
        }
    }
}

impl std::error::Error for OidcError {}
