use std::fmt;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;

/// Name of both the session cookie and its query-string fallback.
pub const TOKEN_NAME: &str = "token";

/// Lifetime of a `token` cookie captured from the URL.
pub const TOKEN_COOKIE_DAYS: i64 = 7;

/// Opaque bearer credential. Validity is decided by the backend, never here.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Locates the bearer token: the `token` cookie wins, then the first `token` query pair.
///
/// An empty value counts as present and is returned unchanged; rejecting it is the
/// caller's decision.
pub fn extract(cookies: &CookieJar, query: &[(String, String)]) -> Option<BearerToken> {
    if let Some(cookie) = cookies.get(TOKEN_NAME) {
        return Some(BearerToken::new(cookie.value()));
    }

    query
        .iter()
        .find(|(key, _)| key == TOKEN_NAME)
        .map(|(_, value)| BearerToken::new(value.as_str()))
}

/// Attributes of the `token` cookie written when a credential arrives in the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCookie {
    /// Parent domain shared by every product application, if any.
    pub domain: Option<String>,
    pub secure: bool,
}

impl TokenCookie {
    pub fn build(&self, token: &BearerToken) -> Cookie<'static> {
        let mut cookie = Cookie::build((TOKEN_NAME, token.as_str().to_owned()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(TimeDuration::days(TOKEN_COOKIE_DAYS));
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }
        cookie.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cookie_wins_over_query() {
        let jar = CookieJar::new().add(Cookie::new("token", "abc"));
        let token = extract(&jar, &query(&[("token", "xyz")]));
        assert_eq!(token, Some(BearerToken::new("abc")));
    }

    #[test]
    fn test_query_fallback() {
        let token = extract(&CookieJar::new(), &query(&[("tab", "1"), ("token", "xyz")]));
        assert_eq!(token, Some(BearerToken::new("xyz")));
    }

    #[test]
    fn test_absent_when_neither_source() {
        let jar = CookieJar::new().add(Cookie::new("theme", "dark"));
        assert_eq!(extract(&jar, &query(&[("tab", "1")])), None);
    }

    #[test]
    fn test_empty_cookie_is_present() {
        let jar = CookieJar::new().add(Cookie::new("token", ""));
        let token = extract(&jar, &query(&[("token", "xyz")]));
        assert_eq!(token, Some(BearerToken::new("")));
        assert!(token.is_some_and(|t| t.is_empty()));
    }

    #[test]
    fn test_debug_is_redacted() {
        let rendered = format!("{:?}", BearerToken::new("secret-value"));
        assert!(!rendered.contains("secret-value"));
    }

    #[test]
    fn test_token_cookie_attributes() {
        let policy = TokenCookie {
            domain: Some(".example.com".into()),
            secure: true,
        };
        let rendered = policy.build(&BearerToken::new("abc")).to_string();
        assert!(rendered.starts_with("token=abc;"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Domain=example.com"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Secure"));

        let host_only = TokenCookie::default().build(&BearerToken::new("abc")).to_string();
        assert!(!host_only.contains("Domain="));
        assert!(!host_only.contains("Secure"));
    }
}
