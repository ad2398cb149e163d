use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::credential::TokenCookie;
use crate::edge::EdgeInterceptor;
use crate::session::SessionApi;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Client for the upstream application. Never follows redirects.
    pub http: Client,
    /// Backend session API; only consulted on the admin surface.
    pub sessions: Arc<dyn SessionApi>,
    pub interceptor: Arc<EdgeInterceptor>,
}

impl AppState {
    pub fn new(config: Config, http: Client, sessions: Arc<dyn SessionApi>) -> Self {
        let interceptor = EdgeInterceptor::new(
            config.auth_origin.clone(),
            config.self_origin.clone(),
            config.routes.clone(),
        )
        .with_token_cookie(TokenCookie {
            domain: config.cookie_domain.clone(),
            secure: config.environment.is_production(),
        });
        Self {
            config: Arc::new(config),
            http,
            sessions,
            interceptor: Arc::new(interceptor),
        }
    }
}
