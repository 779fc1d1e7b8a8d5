//! Identity resolvers and the ordered resolver chain.
//!
//! Each resolver looks at one credential format and either produces a
//! verified identity or nothing. Verification failures are logged and
//! swallowed here: a bad credential is indistinguishable from a missing
//! one to everything above this module.

use std::fmt;

use crate::credentials::RequestCredentials;
use crate::federated::{FEDERATED_SESSION_COOKIE, FederatedSessions};
use crate::identity::{IdentitySource, ResolvedIdentity};
use crate::jwt::JwtCodec;
use crate::token::{CustomClaims, TOKEN_COOKIE};

/// A strategy that derives an identity from request credentials.
pub trait IdentityResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the verified identity, or `None` when this resolver's
    /// credential is absent, invalid, or does not describe a usable identity.
    fn resolve(&self, credentials: &RequestCredentials) -> Option<ResolvedIdentity>;
}

/// Where a custom token is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Cookie,
    BearerHeader,
}

/// Verifies custom tokens from the `token` cookie or a bearer header.
///
/// A resolver built with an empty secret stays usable but resolves nothing.
#[derive(Debug, Clone)]
pub struct CustomTokenResolver {
    codec: Option<JwtCodec>,
    transport: Transport,
}

impl CustomTokenResolver {
    /// Resolver for the `token` cookie.
    #[must_use]
    pub fn from_cookie(secret: &str) -> Self {
        Self::build(secret, Transport::Cookie)
    }

    /// Resolver for `Authorization: Bearer <token>`.
    #[must_use]
    pub fn from_bearer_header(secret: &str) -> Self {
        Self::build(secret, Transport::BearerHeader)
    }

    fn build(secret: &str, transport: Transport) -> Self {
        let codec = match JwtCodec::new(secret) {
            Ok(codec) => Some(codec),
            Err(e) => {
                tracing::error!(error = %e, "custom token resolver has no secret; rejecting all tokens");
                None
            }
        };
        Self { codec, transport }
    }

    fn source(&self) -> IdentitySource {
        match self.transport {
            Transport::Cookie => IdentitySource::CustomToken,
            Transport::BearerHeader => IdentitySource::BearerToken,
        }
    }
}

impl IdentityResolver for CustomTokenResolver {
    fn name(&self) -> &'static str {
        match self.transport {
            Transport::Cookie => "custom_token",
            Transport::BearerHeader => "bearer_token",
        }
    }

    fn resolve(&self, credentials: &RequestCredentials) -> Option<ResolvedIdentity> {
        let token = match self.transport {
            Transport::Cookie => credentials.cookie(TOKEN_COOKIE),
            Transport::BearerHeader => credentials.bearer_token(),
        }?;

        let Some(codec) = &self.codec else {
            tracing::error!(resolver = self.name(), "token present but no secret configured");
            return None;
        };

        let claims: CustomClaims = codec
            .verify(token)
            .inspect_err(|e| {
                tracing::debug!(resolver = self.name(), error = %e, "token verification failed");
            })
            .ok()?;

        claims
            .into_identity(self.source())
            .inspect_err(|e| {
                tracing::warn!(resolver = self.name(), error = %e, "verified token is not a usable identity");
            })
            .ok()
    }
}

/// Resolves identities from the federated subsystem's own session cookie.
#[derive(Debug, Clone)]
pub struct FederatedSessionResolver {
    sessions: FederatedSessions,
}

impl FederatedSessionResolver {
    #[must_use]
    pub fn new(sessions: FederatedSessions) -> Self {
        Self { sessions }
    }
}

impl IdentityResolver for FederatedSessionResolver {
    fn name(&self) -> &'static str {
        "federated_session"
    }

    fn resolve(&self, credentials: &RequestCredentials) -> Option<ResolvedIdentity> {
        let token = credentials.cookie(FEDERATED_SESSION_COOKIE)?;

        let claims = self
            .sessions
            .verify(token)
            .inspect_err(|e| {
                tracing::debug!(resolver = self.name(), error = %e, "session verification failed");
            })
            .ok()?;

        claims
            .into_identity()
            .inspect_err(|e| {
                tracing::warn!(resolver = self.name(), error = %e, "verified session is not a usable identity");
            })
            .ok()
    }
}

/// Ordered list of resolvers; the first identity wins.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn IdentityResolver>>,
}

impl ResolverChain {
    /// Creates an empty chain, which never resolves anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver to the end of the chain.
    #[must_use]
    pub fn with(mut self, resolver: impl IdentityResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Chain used by the page gate: the `token` cookie, then the federated session.
    #[must_use]
    pub fn for_pages(custom_secret: &str, federated: Option<FederatedSessions>) -> Self {
        let chain = Self::new().with(CustomTokenResolver::from_cookie(custom_secret));
        match federated {
            Some(sessions) => chain.with(FederatedSessionResolver::new(sessions)),
            None => chain,
        }
    }

    /// Chain used by API handlers: cookie, bearer header, then the federated session.
    #[must_use]
    pub fn for_api(custom_secret: &str, federated: Option<FederatedSessions>) -> Self {
        let chain = Self::new()
            .with(CustomTokenResolver::from_cookie(custom_secret))
            .with(CustomTokenResolver::from_bearer_header(custom_secret));
        match federated {
            Some(sessions) => chain.with(FederatedSessionResolver::new(sessions)),
            None => chain,
        }
    }

    /// Returns the first identity any resolver produces.
    pub fn resolve(&self, credentials: &RequestCredentials) -> Option<ResolvedIdentity> {
        self.resolvers.iter().find_map(|resolver| {
            let identity = resolver.resolve(credentials)?;
            tracing::debug!(
                resolver = resolver.name(),
                role = %identity.role(),
                "resolved identity"
            );
            Some(identity)
        })
    }

    /// Names of the resolvers, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::token::TokenIssuer;
    use crate::user::User;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "custom-secret";
    const FEDERATED_SECRET: &str = "federated-secret";

    fn user(role: Role) -> User {
        User::new("Tara".to_string(), "tara@example.com".to_string(), role)
    }

    fn custom_token(role: Role) -> String {
        TokenIssuer::new(SECRET)
            .expect("issuer")
            .issue(&user(role))
            .expect("issue")
    }

    fn federated() -> FederatedSessions {
        FederatedSessions::new(FEDERATED_SECRET).expect("sessions")
    }

    #[test]
    fn cookie_resolver_accepts_valid_token() {
        let resolver = CustomTokenResolver::from_cookie(SECRET);
        let creds = RequestCredentials::new().with_cookie(TOKEN_COOKIE, custom_token(Role::Admin));

        let identity = resolver.resolve(&creds).expect("identity");
        assert!(identity.is_admin());
        assert_eq!(identity.source(), IdentitySource::CustomToken);
    }

    #[test]
    fn cookie_resolver_ignores_bearer_header() {
        let resolver = CustomTokenResolver::from_cookie(SECRET);
        let creds = RequestCredentials::new()
            .with_authorization(format!("Bearer {}", custom_token(Role::User)));
        assert!(resolver.resolve(&creds).is_none());
    }

    #[test]
    fn bearer_resolver_reads_header() {
        let resolver = CustomTokenResolver::from_bearer_header(SECRET);
        let creds = RequestCredentials::new()
            .with_authorization(format!("Bearer {}", custom_token(Role::User)));

        let identity = resolver.resolve(&creds).expect("identity");
        assert_eq!(identity.role(), Role::User);
        assert_eq!(identity.source(), IdentitySource::BearerToken);
    }

    #[test]
    fn resolver_without_secret_resolves_nothing() {
        let resolver = CustomTokenResolver::from_cookie("");
        let creds = RequestCredentials::new().with_cookie(TOKEN_COOKIE, custom_token(Role::Admin));
        assert!(resolver.resolve(&creds).is_none());
    }

    #[test]
    fn verified_token_without_role_resolves_nothing() {
        #[derive(serde::Serialize)]
        struct Roleless {
            id: &'static str,
            email: &'static str,
            exp: i64,
        }

        let token = encode(
            &Header::default(),
            &Roleless {
                id: "usr_1",
                email: "tara@example.com",
                exp: Utc::now().timestamp() + 3600,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode");

        let resolver = CustomTokenResolver::from_cookie(SECRET);
        let creds = RequestCredentials::new().with_cookie(TOKEN_COOKIE, token);
        assert!(resolver.resolve(&creds).is_none());
    }

    #[test]
    fn federated_resolver_reads_its_own_cookie() {
        let resolver = FederatedSessionResolver::new(federated());
        let session = federated().mint("sub-1", &user(Role::User)).expect("mint");

        let creds = RequestCredentials::new().with_cookie(FEDERATED_SESSION_COOKIE, session.clone());
        let identity = resolver.resolve(&creds).expect("identity");
        assert_eq!(identity.source(), IdentitySource::FederatedSession);

        // The same session placed in the custom cookie is not a federated credential.
        let creds = RequestCredentials::new().with_cookie(TOKEN_COOKIE, session);
        assert!(resolver.resolve(&creds).is_none());
    }

    #[test]
    fn chain_prefers_earlier_resolver() {
        let chain = ResolverChain::for_pages(SECRET, Some(federated()));
        let session = federated().mint("sub-1", &user(Role::Admin)).expect("mint");
        let creds = RequestCredentials::new()
            .with_cookie(TOKEN_COOKIE, custom_token(Role::User))
            .with_cookie(FEDERATED_SESSION_COOKIE, session);

        let identity = chain.resolve(&creds).expect("identity");
        assert_eq!(identity.source(), IdentitySource::CustomToken);
        assert_eq!(identity.role(), Role::User);
    }

    #[test]
    fn chain_falls_back_when_custom_token_is_invalid() {
        let chain = ResolverChain::for_pages(SECRET, Some(federated()));
        let session = federated().mint("sub-1", &user(Role::Admin)).expect("mint");
        let creds = RequestCredentials::new()
            .with_cookie(TOKEN_COOKIE, "garbage")
            .with_cookie(FEDERATED_SESSION_COOKIE, session);

        let identity = chain.resolve(&creds).expect("identity");
        assert_eq!(identity.source(), IdentitySource::FederatedSession);
        assert!(identity.is_admin());
    }

    #[test]
    fn chain_names_reflect_construction() {
        assert_eq!(
            ResolverChain::for_pages(SECRET, None).names(),
            vec!["custom_token"]
        );
        assert_eq!(
            ResolverChain::for_api(SECRET, Some(federated())).names(),
            vec!["custom_token", "bearer_token", "federated_session"]
        );
        assert!(ResolverChain::new().resolve(&RequestCredentials::new()).is_none());
    }
}
