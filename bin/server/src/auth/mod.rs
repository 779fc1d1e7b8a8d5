//! Authentication for the storefront server.
//!
//! This module provides:
//! - The request gate middleware protecting `/admin` and `/user` pages
//! - Password registration, login and logout under `/api`
//! - Federated login through an external OIDC provider
//! - Identity extractors for handlers
//!
//! Identities are never stored server-side. Every request is resolved
//! again from its `token` cookie or federated session cookie.

pub mod db;
pub mod federated;
pub mod middleware;
pub mod oidc;
pub mod routes;

use anaya_candles_access::{FederatedSessions, Gate, ResolverChain, TokenIssuer};
use chrono::Duration;
use std::sync::Arc;

use crate::config::{GateConfig, ServerConfig, SessionConfig};
use db::UserStore;

pub use middleware::{CurrentIdentity, OptionalIdentity, gate};
pub use oidc::OidcClient;

/// Shared application state.
pub struct AppState {
    /// User record storage.
    pub users: Arc<dyn UserStore>,
    /// Gate applied to every page request.
    pub gate: Gate,
    /// Resolvers used by API extractors, which also accept bearer tokens.
    pub api_resolvers: ResolverChain,
    /// Mints the `token` cookie. Absent when no secret is configured.
    pub token_issuer: Option<TokenIssuer>,
    /// Mints federated sessions. Absent when no federated secret is configured.
    pub federated_sessions: Option<FederatedSessions>,
    /// OIDC client. Absent when federated login is not configured.
    pub oidc_client: Option<OidcClient>,
    /// Cookie configuration.
    pub session_config: SessionConfig,
    /// Redirect targets.
    pub gate_config: GateConfig,
}

impl AppState {
    /// Builds the application state from configuration.
    ///
    /// Missing secrets are logged, not fatal: the gate then fails closed
    /// for every protected path.
    pub fn from_config(
        config: &ServerConfig,
        users: Arc<dyn UserStore>,
        oidc_client: Option<OidcClient>,
    ) -> Self {
        let token_issuer = match TokenIssuer::new(&config.jwt_secret) {
            Ok(issuer) => Some(issuer.with_lifetime(Duration::days(config.session.token_days))),
            Err(e) => {
                tracing::error!(error = %e, "custom token signing disabled");
                None
            }
        };

        let federated_sessions = if config.federated.secret.is_empty() {
            None
        } else {
            FederatedSessions::new(&config.federated.secret)
                .map(|sessions| {
                    sessions.with_lifetime(Duration::days(config.federated.session_days))
                })
                .ok()
        };

        if oidc_client.is_some() && federated_sessions.is_none() {
            tracing::warn!("federated login is configured without FEDERATED__SECRET; callbacks will fail");
        }

        let gate = Gate::new(
            config.gate.protected.clone(),
            ResolverChain::for_pages(&config.jwt_secret, federated_sessions.clone()),
        );
        let api_resolvers = ResolverChain::for_api(&config.jwt_secret, federated_sessions.clone());

        tracing::info!(gate = ?gate, "request gate ready");

        Self {
            users,
            gate,
            api_resolvers,
            token_issuer,
            federated_sessions,
            oidc_client,
            session_config: config.session.clone(),
            gate_config: config.gate.clone(),
        }
    }
}
