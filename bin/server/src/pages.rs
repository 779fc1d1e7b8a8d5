//! Storefront pages.
//!
//! These handlers only report who is signed in, as plain text. The gate
//! middleware has already run by the time any of them is reached.

use axum::{http::StatusCode, response::IntoResponse};

use crate::auth::OptionalIdentity;

fn greeting(identity: &OptionalIdentity) -> String {
    match &identity.0 {
        Some(identity) => {
            let who = identity.name().or(identity.email()).unwrap_or("there");
            format!("Signed in as {} ({})", who, identity.role())
        }
        None => "Not signed in. Log in at /login".to_string(),
    }
}

pub async fn home(identity: OptionalIdentity) -> String {
    format!("Anaya Candles\n{}", greeting(&identity))
}

pub async fn login() -> &'static str {
    "Log in\nPOST /api/login with your email and password, or continue with your provider at /auth/federated/login"
}

pub async fn unauthorized() -> &'static str {
    "Unauthorized\nYou do not have access to that page."
}

pub async fn admin(identity: OptionalIdentity) -> String {
    format!("Admin dashboard\n{}", greeting(&identity))
}

pub async fn account(identity: OptionalIdentity) -> String {
    format!("Your account\n{}", greeting(&identity))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Page not found")
}
