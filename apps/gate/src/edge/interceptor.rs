use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use reqwest::Url;
use tracing::debug;

use crate::credential::{self, BearerToken, TokenCookie, TOKEN_NAME};
use crate::redirect::{build_redirect_url, parse_query, RedirectContext};
use crate::routing::{classify, is_intercepted, RouteClassification, RouteTable};

/// Query parameters dropped from the URL once a token has been captured from it.
const CAPTURED_PARAMS: &[&str] = &[TOKEN_NAME, "name", "email"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Url),
}

/// A token handed over in the URL: store it as a cookie and reload without it.
#[derive(Debug, Clone)]
pub struct TokenCapture {
    pub location: String,
    pub cookie: Cookie<'static>,
}

/// Per-application edge interceptor. Decides allow/redirect from request-local data only.
#[derive(Debug, Clone)]
pub struct EdgeInterceptor {
    auth_origin: Url,
    self_origin: String,
    routes: RouteTable,
    token_cookie: TokenCookie,
}

impl EdgeInterceptor {
    pub fn new(auth_origin: Url, self_origin: impl Into<String>, routes: RouteTable) -> Self {
        Self {
            auth_origin,
            self_origin: self_origin.into(),
            routes,
            token_cookie: TokenCookie::default(),
        }
    }

    pub fn with_token_cookie(mut self, token_cookie: TokenCookie) -> Self {
        self.token_cookie = token_cookie;
        self
    }

    pub fn decide(&self, path: &str, cookies: &CookieJar, query: &[(String, String)]) -> Decision {
        match classify(path, &self.routes) {
            RouteClassification::Public | RouteClassification::Unclassified => Decision::Allow,
            RouteClassification::Protected => {
                // Presence is enough here; the backend judges validity.
                if let Some(token) = credential::extract(cookies, query) {
                    if token.is_empty() {
                        debug!(path, "Empty token on protected route, allowing");
                    }
                    return Decision::Allow;
                }

                let context = RedirectContext::new(&self.self_origin, path, query.to_vec());
                Decision::Redirect(build_redirect_url(&self.auth_origin, &context))
            }
        }
    }

    /// Moves a non-empty `token` query parameter into the cookie store. `None` when a
    /// `token` cookie already exists or the URL carries no token.
    pub fn capture(
        &self,
        path: &str,
        cookies: &CookieJar,
        query: &[(String, String)],
    ) -> Option<TokenCapture> {
        if cookies.get(TOKEN_NAME).is_some() {
            return None;
        }
        let (_, value) = query
            .iter()
            .find(|(key, value)| key == TOKEN_NAME && !value.is_empty())?;

        let cleaned = CAPTURED_PARAMS.iter().fold(
            RedirectContext::new(&self.self_origin, path, query.to_vec()),
            |context, name| context.without_param(name),
        );
        Some(TokenCapture {
            location: cleaned.destination(),
            cookie: self.token_cookie.build(&BearerToken::new(value.as_str())),
        })
    }
}

/// Axum middleware wrapping [`EdgeInterceptor::decide`].
/// Asset and API paths pass through without classification.
pub async fn intercept(
    State(interceptor): State<Arc<EdgeInterceptor>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    if !is_intercepted(&path) {
        return next.run(req).await;
    }

    let cookies = CookieJar::from_headers(req.headers());
    let query = parse_query(req.uri().query().unwrap_or_default());

    match interceptor.decide(&path, &cookies, &query) {
        Decision::Allow => match interceptor.capture(&path, &cookies, &query) {
            Some(capture) => {
                debug!(path = %path, "Token found in URL, storing it as a cookie");
                (
                    [(header::SET_COOKIE, capture.cookie.to_string())],
                    Redirect::temporary(&capture.location),
                )
                    .into_response()
            }
            None => next.run(req).await,
        },
        Decision::Redirect(url) => {
            debug!(path = %path, "No credential on protected route, redirecting to sign-in");
            Redirect::temporary(url.as_str()).into_response()
        }
    }
}
