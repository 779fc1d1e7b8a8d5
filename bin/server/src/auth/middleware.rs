//! Request gate middleware and identity extractors for Axum.

use anaya_candles_access::{GateDecision, RequestCredentials, ResolvedIdentity};
use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::AppState;

/// Collects the cookies and authorization header a resolver may look at.
pub fn credentials_from(jar: &CookieJar, headers: &HeaderMap) -> RequestCredentials {
    let credentials = jar
        .iter()
        .fold(RequestCredentials::new(), |credentials, cookie| {
            credentials.with_cookie(cookie.name(), cookie.value())
        });

    match headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        Some(value) => credentials.with_authorization(value),
        None => credentials,
    }
}

/// Gates every request before routing.
///
/// Unprotected paths pass straight through. Protected paths are forwarded
/// only when a resolver produces an identity meeting the path's requirement.
pub async fn gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let credentials = credentials_from(&jar, request.headers());

    match state.gate.check(&path, &credentials) {
        GateDecision::Forward => next.run(request).await,
        GateDecision::RedirectToLogin => {
            tracing::info!(path = %path, "no usable identity, redirecting to login");
            Redirect::temporary(&state.gate_config.login_path).into_response()
        }
        GateDecision::RedirectToUnauthorized => {
            tracing::warn!(path = %path, "insufficient role, redirecting to unauthorized");
            Redirect::temporary(&state.gate_config.unauthorized_path).into_response()
        }
    }
}

/// Extractor for requiring a resolved identity on API routes.
///
/// Accepts the `token` cookie, a bearer token, or a federated session.
pub struct CurrentIdentity(pub ResolvedIdentity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let credentials = credentials_from(&jar, &parts.headers);

        app_state
            .api_resolvers
            .resolve(&credentials)
            .map(CurrentIdentity)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Extractor for optionally getting the resolved identity.
///
/// Returns None if no credential resolves.
pub struct OptionalIdentity(pub Option<ResolvedIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentIdentity::from_request_parts(parts, state).await {
            Ok(CurrentIdentity(identity)) => Ok(OptionalIdentity(Some(identity))),
            Err(_) => Ok(OptionalIdentity(None)),
        }
    }
}

/// Rejection type for identity extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Not authenticated" })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anaya_candles_access::TOKEN_COOKIE;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn credentials_include_cookies_and_authorization() {
        let jar = CookieJar::new()
            .add(Cookie::new(TOKEN_COOKIE, "abc"))
            .add(Cookie::new("theme", "dark"));
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        let credentials = credentials_from(&jar, &headers);

        assert_eq!(credentials.cookie(TOKEN_COOKIE), Some("abc"));
        assert_eq!(credentials.cookie("theme"), Some("dark"));
        assert_eq!(credentials.bearer_token(), Some("xyz"));
    }

    #[test]
    fn credentials_without_headers_are_empty() {
        let credentials = credentials_from(&CookieJar::new(), &HeaderMap::new());

        assert_eq!(credentials.cookie(TOKEN_COOKIE), None);
        assert_eq!(credentials.bearer_token(), None);
    }
}
