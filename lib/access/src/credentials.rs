//! Request-carried credentials.
//!
//! The web layer copies the request's cookies and `Authorization` header
//! into a `RequestCredentials` value before asking the gate for a decision.
//! Resolvers only ever read from it.

use std::collections::HashMap;
use std::fmt;

/// The credential-bearing parts of a single request.
#[derive(Clone, Default)]
pub struct RequestCredentials {
    cookies: HashMap<String, String>,
    authorization: Option<String>,
}

impl RequestCredentials {
    /// Creates an empty credential set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cookie. A later cookie with the same name replaces an earlier one.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the raw `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Returns a cookie value, treating an empty value as absent.
    ///
    /// Logout overwrites cookies with an empty value, so an empty cookie
    /// carries no credential.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Returns the token from an `Authorization: Bearer <token>` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        let header = self.authorization.as_deref()?;
        let (scheme, token) = header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

impl fmt::Debug for RequestCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.cookies.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RequestCredentials")
            .field("cookies", &names)
            .field("authorization", &self.authorization.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cookie_is_absent() {
        let creds = RequestCredentials::new()
            .with_cookie("token", "")
            .with_cookie("theme", "dark");
        assert_eq!(creds.cookie("token"), None);
        assert_eq!(creds.cookie("theme"), Some("dark"));
        assert_eq!(creds.cookie("missing"), None);
    }

    #[test]
    fn bearer_token_parsing() {
        let creds = RequestCredentials::new().with_authorization("Bearer abc.def.ghi");
        assert_eq!(creds.bearer_token(), Some("abc.def.ghi"));

        let creds = RequestCredentials::new().with_authorization("bearer   abc ");
        assert_eq!(creds.bearer_token(), Some("abc"));

        let creds = RequestCredentials::new().with_authorization("Basic dXNlcjpwYXNz");
        assert_eq!(creds.bearer_token(), None);

        let creds = RequestCredentials::new().with_authorization("Bearer ");
        assert_eq!(creds.bearer_token(), None);

        assert_eq!(RequestCredentials::new().bearer_token(), None);
    }

    #[test]
    fn debug_does_not_leak_values() {
        let creds = RequestCredentials::new()
            .with_cookie("token", "super-secret-jwt")
            .with_authorization("Bearer also-secret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("token"));
        assert!(!rendered.contains("super-secret-jwt"));
        assert!(!rendered.contains("also-secret"));
    }
}
