//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested
//! sections use `__` as separator, e.g. `SESSION__SECURE_COOKIES=false`.
//!
//! See [`OidcConfig`](anaya_candles_access::OidcConfig) for federated
//! login configuration.

use anaya_candles_access::{OidcConfig, ProtectedPrefix, default_rules};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL connection URL. Without it, users live in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Address to bind, e.g. `0.0.0.0:3000`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Shared secret for signing and verifying the custom `token`.
    ///
    /// An empty secret does not stop the server, but every protected
    /// request is sent to the login page and password login fails.
    #[serde(default)]
    pub jwt_secret: String,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Request gate configuration.
    #[serde(default)]
    pub gate: GateConfig,

    /// Federated session configuration.
    #[serde(default)]
    pub federated: FederatedConfig,

    /// OIDC provider for federated login. Federated login is disabled when absent.
    #[serde(default)]
    pub oidc: Option<OidcConfig>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            listen_addr: default_listen_addr(),
            jwt_secret: String::new(),
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            federated: FederatedConfig::default(),
            oidc: None,
        }
    }
}

/// Custom token cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Custom token validity in days.
    #[serde(default = "default_token_days")]
    pub token_days: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_token_days() -> i64 {
    7
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_days: default_token_days(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

/// Where the gate redirects, and which prefixes it protects.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,

    #[serde(default = "default_rules")]
    pub protected: Vec<ProtectedPrefix>,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            unauthorized_path: default_unauthorized_path(),
            protected: default_rules(),
        }
    }
}

/// Federated session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedConfig {
    /// Secret for the federated session, separate from `jwt_secret`.
    #[serde(default)]
    pub secret: String,

    /// Federated session validity in days.
    #[serde(default = "default_session_days")]
    pub session_days: i64,
}

fn default_session_days() -> i64 {
    30
}

impl Default for FederatedConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_days: default_session_days(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
