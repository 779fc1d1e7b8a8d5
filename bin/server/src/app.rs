//! HTTP routing for the storefront.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, federated, routes};
use crate::pages;

/// Builds the application router.
///
/// The gate runs on every request, ahead of method dispatch and the
/// fallback, so protected prefixes stay closed even where no handler exists.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/admin", get(pages::admin))
        .route("/admin/{*rest}", get(pages::admin))
        .route("/user", get(pages::account))
        .route("/user/{*rest}", get(pages::account))
        .route("/api/register", post(routes::register))
        .route("/api/login", post(routes::login))
        .route("/api/logout", post(routes::logout))
        .route("/api/me", get(routes::me))
        .route("/auth/federated/login", get(federated::federated_login))
        .route("/auth/federated/callback", get(federated::federated_callback))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth::gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::db::{MemoryUserStore, UserStore};
    use crate::config::ServerConfig;
    use anaya_candles_access::{
        CustomClaims, FEDERATED_SESSION_COOKIE, FederatedSessions, Role, TOKEN_COOKIE,
        TokenIssuer, User,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use tower::ServiceExt;

    const SECRET: &str = "beeswax-and-soy";
    const FEDERATED_SECRET: &str = "federated-pillar";

    fn test_state() -> (Arc<AppState>, Arc<MemoryUserStore>) {
        let mut config = ServerConfig::default();
        config.jwt_secret = SECRET.to_string();
        config.federated.secret = FEDERATED_SECRET.to_string();
        let users = Arc::new(MemoryUserStore::new());
        let state = AppState::from_config(&config, users.clone(), None);
        (Arc::new(state), users)
    }

    fn token_for(role: Role) -> String {
        let user = User::new("Asha".to_string(), "asha@example.com".to_string(), role);
        TokenIssuer::new(SECRET).expect("issuer").issue(&user).expect("token")
    }

    fn get_with_cookie(uri: &str, cookie: Option<String>) -> Request<Body> {
        let builder = Request::builder().uri(uri);
        let builder = match cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        };
        builder.body(Body::empty()).expect("request")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn location(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn admin_token_reaches_admin_pages() {
        let (state, _) = test_state();
        let cookie = format!("{}={}", TOKEN_COOKIE, token_for(Role::Admin));

        let response = router(state)
            .oneshot(get_with_cookie("/admin/products", Some(cookie)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_token_on_admin_page_redirects_to_unauthorized() {
        let (state, _) = test_state();
        let cookie = format!("{}={}", TOKEN_COOKIE, token_for(Role::User));

        let response = router(state)
            .oneshot(get_with_cookie("/admin/products", Some(cookie)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/unauthorized"));
    }

    #[tokio::test]
    async fn anonymous_user_page_redirects_to_login() {
        let (state, _) = test_state();

        let response = router(state)
            .oneshot(get_with_cookie("/user/cart", None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn unprotected_path_is_never_redirected() {
        let (state, _) = test_state();

        let response = router(state)
            .oneshot(get_with_cookie("/public/about", None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(location(&response), None);
    }

    #[tokio::test]
    async fn unrouted_method_under_protected_prefix_is_gated() {
        let (state, _) = test_state();
        let app = router(state);

        // Only GET is routed under /admin; the gate answers before method dispatch.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/login"));

        let cookie = format!("{}={}", TOKEN_COOKIE, token_for(Role::User));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/admin/products/7")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(location(&response), Some("/unauthorized"));
    }

    #[tokio::test]
    async fn expired_token_redirects_to_login() {
        let (state, _) = test_state();
        let now = chrono::Utc::now().timestamp();
        let claims = CustomClaims {
            id: Some("usr_1".to_string()),
            role: Some("admin".to_string()),
            email: None,
            iat: now - 120,
            exp: now - 60,
        };
        let token = TokenIssuer::new(SECRET)
            .expect("issuer")
            .issue_claims(&claims)
            .expect("token");

        let response = router(state)
            .oneshot(get_with_cookie(
                "/admin",
                Some(format!("{}={}", TOKEN_COOKIE, token)),
            ))
            .await
            .expect("response");

        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn federated_session_is_accepted_when_custom_token_absent() {
        let (state, _) = test_state();
        let admin = User::new("Kiran".to_string(), "kiran@example.com".to_string(), Role::Admin);
        let session = FederatedSessions::new(FEDERATED_SECRET)
            .expect("sessions")
            .mint("provider|42", &admin)
            .expect("session");

        let response = router(state)
            .oneshot(get_with_cookie(
                "/admin/orders",
                Some(format!("{}={}", FEDERATED_SESSION_COOKIE, session)),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_then_login_sets_token_cookie() {
        let (state, users) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/register",
                serde_json::json!({
                    "name": "Asha",
                    "email": " Asha@Example.com ",
                    "password": "lavender"
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "User registered successfully"
        );

        let stored = users
            .find_by_email("asha@example.com")
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored.role(), Role::User);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/login",
                serde_json::json!({ "email": "asha@example.com", "password": "lavender" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = set_cookies(&response);
        let token_cookie = cookies
            .iter()
            .find(|c| c.starts_with("token="))
            .expect("token cookie");
        assert!(token_cookie.contains("HttpOnly"));
        assert!(token_cookie.contains("Secure"));
        assert!(token_cookie.contains("SameSite=Lax"));
        assert!(token_cookie.contains("Path=/"));
        assert!(token_cookie.contains("Max-Age=604800"));

        let pair = token_cookie.split(';').next().expect("pair").to_string();
        let response = app
            .oneshot(get_with_cookie("/user/cart", Some(pair)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (state, _) = test_state();
        let app = router(state);
        let body = serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "lavender"
        });

        let first = app
            .clone()
            .oneshot(post_json("/api/register", body.clone()))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_json("/api/register", body))
            .await
            .expect("response");
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(second).await["message"], "User already exists");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (state, users) = test_state();
        let hash = anaya_candles_access::hash_password("lavender").expect("hash");
        let user = User::new("Asha".to_string(), "asha@example.com".to_string(), Role::User)
            .with_password_hash(hash);
        users.create(&user).await.expect("create");

        let response = router(state)
            .oneshot(post_json(
                "/api/login",
                serde_json::json!({ "email": "asha@example.com", "password": "sandalwood" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        assert_eq!(json_body(response).await["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn logout_clears_both_session_cookies() {
        let (state, _) = test_state();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/logout")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        for name in [TOKEN_COOKIE, FEDERATED_SESSION_COOKIE] {
            let cookie = cookies
                .iter()
                .find(|c| c.starts_with(&format!("{}=", name)))
                .expect("cleared cookie");
            assert!(cookie.contains("Max-Age=0"));
            assert!(cookie.contains("HttpOnly"));
            assert!(cookie.contains("Secure"));
            assert!(cookie.contains("SameSite=Lax"));
            assert!(cookie.contains("Path=/"));
        }
    }

    #[tokio::test]
    async fn me_requires_identity_and_accepts_bearer() {
        let (state, _) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/me", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token_for(Role::Admin)),
                    )
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["role"], "admin");
        assert_eq!(body["source"], "bearer_token");
    }

    #[tokio::test]
    async fn bearer_token_does_not_open_protected_pages() {
        let (state, _) = test_state();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/admin")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token_for(Role::Admin)),
                    )
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(location(&response), Some("/login"));
    }
}
