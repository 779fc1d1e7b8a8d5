//! Session credentials, identity resolution and the request gate for the
//! Anaya Candles storefront.
//!
//! This crate provides:
//! - User records and roles (`User`, `Role`)
//! - The two session credential formats: the custom token minted at
//!   password login and the federated session minted after an external
//!   OpenID Connect login
//! - Identity resolvers and the ordered `ResolverChain`
//! - The `Gate`, which maps a request path and its credentials to a
//!   forward/redirect decision
//!
//! The crate is framework-agnostic: callers describe the request through
//! `RequestCredentials` and act on the returned `GateDecision`.
//!
//! # Example
//!
//! ```
//! use anaya_candles_access::{
//!     Gate, GateDecision, RequestCredentials, ResolverChain, Role, TokenIssuer, User,
//!     TOKEN_COOKIE,
//! };
//!
//! let secret = "candle-wax-and-wicks";
//! let issuer = TokenIssuer::new(secret).expect("secret is set");
//! let user = User::new("Asha".to_string(), "asha@example.com".to_string(), Role::User);
//! let token = issuer.issue(&user).expect("token");
//!
//! let gate = Gate::with_default_rules(ResolverChain::for_pages(secret, None));
//! let credentials = RequestCredentials::new().with_cookie(TOKEN_COOKIE, token);
//!
//! assert_eq!(gate.check("/user/cart", &credentials), GateDecision::Forward);
//! assert_eq!(gate.check("/admin/products", &credentials), GateDecision::RedirectToUnauthorized);
//! ```

pub mod credentials;
pub mod error;
pub mod federated;
pub mod gate;
pub mod identity;
pub mod jwt;
pub mod oidc;
pub mod password;
pub mod resolver;
pub mod role;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use credentials::RequestCredentials;
pub use error::{IdentityError, PasswordError, RuleError, TokenError};
pub use federated::{FEDERATED_SESSION_COOKIE, FederatedClaims, FederatedSessions};
pub use gate::{Gate, GateDecision, ProtectedPrefix, Requirement, default_rules};
pub use identity::{IdentitySource, ResolvedIdentity};
pub use jwt::JwtCodec;
pub use oidc::{FederatedProfile, OidcConfig};
pub use password::{hash_password, verify_password};
pub use resolver::{
    CustomTokenResolver, FederatedSessionResolver, IdentityResolver, ResolverChain,
};
pub use role::Role;
pub use token::{CustomClaims, TOKEN_COOKIE, TokenIssuer};
pub use user::User;
