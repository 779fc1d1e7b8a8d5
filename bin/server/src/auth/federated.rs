//! Federated login through an external OIDC provider.
//!
//! A successful callback maps the provider's verified email to a
//! storefront user, creating one with the `user` role on first sign-in,
//! and sets the `federated_session` cookie.

use anaya_candles_access::{FEDERATED_SESSION_COOKIE, FederatedProfile, Role, User};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, oidc::AuthState, routes::AuthError, routes::normalize_email};
use crate::error::StoreError;

/// Auth state cookie name (for CSRF protection during the OIDC flow).
const AUTH_STATE_COOKIE: &str = "federated_auth_state";

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Serializable auth state for cookie storage.
#[derive(Debug, Serialize, Deserialize)]
struct AuthStateData {
    csrf_token: String,
    pkce_verifier: String,
    nonce: String,
}

/// Starts federated login by redirecting to the identity provider.
pub async fn federated_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let oidc_client = state
        .oidc_client
        .as_ref()
        .ok_or(AuthError::FederatedUnavailable)?;
    let (auth_url, auth_state) = oidc_client.authorization_url();

    let auth_state_json = serde_json::to_string(&AuthStateData {
        csrf_token: auth_state.csrf_token,
        pkce_verifier: auth_state.pkce_verifier,
        nonce: auth_state.nonce,
    })
    .map_err(|e| AuthError::Internal(format!("serialize auth state: {}", e)))?;

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Completes federated login and sets the federated session cookie.
pub async fn federated_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let oidc_client = state
        .oidc_client
        .as_ref()
        .ok_or(AuthError::FederatedUnavailable)?;
    let Some(sessions) = &state.federated_sessions else {
        return Err(AuthError::Internal(
            "federated callback without a session secret".to_string(),
        ));
    };

    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;
    let auth_state_data: AuthStateData =
        serde_json::from_str(auth_state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    if query.state != auth_state_data.csrf_token {
        return Err(AuthError::CsrfMismatch);
    }

    let auth_state = AuthState {
        csrf_token: auth_state_data.csrf_token,
        pkce_verifier: auth_state_data.pkce_verifier,
        nonce: auth_state_data.nonce,
    };

    let profile = oidc_client
        .exchange_code(&query.code, &auth_state)
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let user = user_for_profile(&state, &profile).await?;

    let token = sessions
        .mint(&profile.subject, &user)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let session_cookie = Cookie::build((FEDERATED_SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(sessions.lifetime().num_seconds()));

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    tracing::info!(user_id = %user.id(), issuer = %profile.issuer, "federated login");
    Ok((jar.add(session_cookie).add(remove_auth_state), Redirect::to("/")))
}

/// Maps a provider profile to a storefront user by its verified email.
async fn user_for_profile(state: &AppState, profile: &FederatedProfile) -> Result<User, AuthError> {
    let Some(email) = profile.sign_in_email() else {
        tracing::warn!(
            subject = %profile.subject,
            issuer = %profile.issuer,
            "federated profile has no verified email"
        );
        return Err(AuthError::MissingEmail);
    };
    find_or_create_user(state, &normalize_email(email), profile.account_name()).await
}

/// Looks up the storefront user for an email, creating a `user` account if none exists.
async fn find_or_create_user(state: &AppState, email: &str, name: &str) -> Result<User, AuthError> {
    if let Some(user) = state.users.find_by_email(email).await? {
        return Ok(user);
    }

    let user = User::new(name.to_string(), email.to_string(), Role::User);
    match state.users.create(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id(), "created user from federated login");
            Ok(user)
        }
        // Lost a race with a concurrent sign-in for the same email.
        Err(StoreError::DuplicateEmail { .. }) => state
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::Database(format!("user '{}' vanished", email))),
        Err(e) => Err(e.into()),
    }
}
