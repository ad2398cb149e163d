use std::sync::{Arc, OnceLock};

use axum::{
    extract::{Request, State},
    http::{header, HeaderName},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use tracing::debug;

use crate::credential::{self, TOKEN_NAME};
use crate::errors::AppError;
use crate::redirect::{parse_query, RedirectContext};
use crate::routes::forward::forward;
use crate::routing::is_intercepted;
use crate::session::{AdminGate, AdminSession, Navigator, SignOutCoordinator};
use crate::state::AppState;

/// Captures the single navigation a gate or coordinator asks for, so the handler
/// can answer with it as a redirect.
#[derive(Clone, Default)]
pub struct NavigationSlot(Arc<OnceLock<String>>);

impl NavigationSlot {
    pub fn location(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }
}

impl Navigator for NavigationSlot {
    fn navigate(&self, location: &str) {
        if self.0.set(location.to_string()).is_err() {
            debug!("Navigation already pending, ignoring a second one");
        }
    }
}

/// Admin surface fallback: verify admin rights, then forward. Never renders before
/// the verification settles.
pub async fn handle_admin_request(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
) -> Result<Response, AppError> {
    if !is_intercepted(req.uri().path()) {
        return forward(&state, req).await;
    }

    let query = parse_query(req.uri().query().unwrap_or_default());
    let token = credential::extract(&jar, &query);
    // A rejected token in the URL must not travel on to sign-in.
    let current = RedirectContext::from_uri(&state.config.self_origin, req.uri())
        .without_param(TOKEN_NAME);

    let slot = NavigationSlot::default();
    let mut gate = AdminGate::new(
        Arc::clone(&state.sessions),
        slot.clone(),
        state.config.auth_origin.clone(),
        state.config.verify_timeout,
    );

    if gate.verify(token.as_ref(), &current).await.is_some() {
        req.extensions_mut().insert(gate.session().clone());
        return forward(&state, req).await;
    }

    let location = slot
        .location()
        .unwrap_or(state.config.auth_origin.as_str())
        .to_string();
    Ok(Redirect::temporary(&location).into_response())
}

/// POST /logout
pub async fn handle_sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = credential::extract(&jar, &[]);

    let slot = NavigationSlot::default();
    let coordinator = SignOutCoordinator::new(
        Arc::clone(&state.sessions),
        slot.clone(),
        state.config.auth_origin.clone(),
        state.config.sign_out_grace,
    );
    let mut session = AdminSession::default();
    coordinator.sign_out(token.as_ref(), &mut session).await;

    let location = slot
        .location()
        .unwrap_or(state.config.auth_origin.as_str())
        .to_string();
    (
        AppendHeaders(expired_token_cookies(state.config.cookie_domain.as_deref())),
        Redirect::to(&location),
    )
        .into_response()
}

/// Expires the `token` cookie host-only and, when configured, on the parent domain.
fn expired_token_cookies(domain: Option<&str>) -> Vec<(HeaderName, String)> {
    let mut host_only = Cookie::build((TOKEN_NAME, "")).path("/").build();
    host_only.make_removal();
    let mut cookies = vec![(header::SET_COOKIE, host_only.to_string())];

    if let Some(domain) = domain {
        let mut scoped = Cookie::build((TOKEN_NAME, ""))
            .path("/")
            .domain(domain.to_string())
            .build();
        scoped.make_removal();
        cookies.push((header::SET_COOKIE, scoped.to_string()));
    }

    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keeps_first_navigation() {
        let slot = NavigationSlot::default();
        assert_eq!(slot.location(), None);
        slot.navigate("https://auth.example.com/?redirect=a");
        slot.navigate("https://auth.example.com/?redirect=b");
        assert_eq!(slot.location(), Some("https://auth.example.com/?redirect=a"));
    }

    #[test]
    fn test_expired_cookies_cover_both_scopes() {
        let cookies = expired_token_cookies(Some(".example.com"));
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|(name, _)| *name == header::SET_COOKIE));
        assert!(cookies[0].1.starts_with("token=;"));
        assert!(cookies[0].1.contains("Max-Age=0"));
        assert!(cookies[1].1.contains("Domain=example.com"));

        assert_eq!(expired_token_cookies(None).len(), 1);
    }
}
