//! Password registration, login, logout and identity routes.

use anaya_candles_access::{
    FEDERATED_SESSION_COOKIE, ResolvedIdentity, Role, TOKEN_COOKIE, User, hash_password,
    verify_password,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, middleware::CurrentIdentity};
use crate::error::StoreError;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Trims and lowercases an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a password account with the `user` role.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let name = body.name.trim();
    let email = normalize_email(&body.email);
    if name.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::UserExists);
    }

    let hash = hash_password(&body.password).map_err(|e| AuthError::Internal(e.to_string()))?;
    let user = User::new(name.to_string(), email, Role::User).with_password_hash(hash);

    match state.users.create(&user).await {
        Ok(()) => {}
        Err(StoreError::DuplicateEmail { .. }) => return Err(AuthError::UserExists),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id(), "registered user");
    Ok(Json(json!({ "message": "User registered successfully" })))
}

/// Verifies a password and sets the `token` cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(issuer) = &state.token_issuer else {
        return Err(AuthError::Internal(
            "login attempted without a token secret".to_string(),
        ));
    };

    let email = normalize_email(&body.email);
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    // Federated-only accounts have no password to check.
    let hash = user
        .password_hash()
        .ok_or(AuthError::InvalidCredentials)?;
    let valid = verify_password(&body.password, hash).map_err(|e| {
        tracing::warn!(user_id = %user.id(), error = %e, "stored password hash is unusable");
        AuthError::InvalidCredentials
    })?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let token = issuer
        .issue(&user)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let cookie = Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::days(state.session_config.token_days));

    tracing::info!(user_id = %user.id(), role = %user.role(), "password login");
    Ok((jar.add(cookie), Json(json!({ "message": "Login successful" }))))
}

/// Clears both session cookies.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let secure = state.session_config.secure_cookies;
    (
        jar.add(expired_cookie(TOKEN_COOKIE, secure))
            .add(expired_cookie(FEDERATED_SESSION_COOKIE, secure)),
        Json(json!({ "message": "Logout successful" })),
    )
}

/// An empty, already-expired cookie carrying the same attributes as the one it replaces.
fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Returns the identity resolved for this request.
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<ResolvedIdentity> {
    Json(identity)
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    MissingFields,
    UserExists,
    InvalidCredentials,
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    FederatedUnavailable,
    TokenExchange(String),
    MissingEmail,
    Database(String),
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingFields => (StatusCode::BAD_REQUEST, "Name, email and password are required"),
            Self::UserExists => (StatusCode::BAD_REQUEST, "User already exists"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::FederatedUnavailable => (StatusCode::NOT_FOUND, "Federated login is not enabled"),
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::MissingEmail => (
                StatusCode::FORBIDDEN,
                "Your identity provider did not share a verified email address",
            ),
            Self::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::UserExists.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Database("down".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
