pub mod admin;
pub mod forward;
pub mod health;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::config::AppKind;
use crate::edge::{enforce_https, intercept};
use crate::state::AppState;

/// Builds the gate router. Layer order, outermost first:
/// HTTPS enforcement → edge interceptor → body limit → handler.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new().route("/health", get(health::health_handler));

    let router = match state.config.app {
        AppKind::Admin => router
            .route("/logout", post(admin::handle_sign_out))
            .fallback(admin::handle_admin_request),
        AppKind::Editor | AppKind::Interview | AppKind::Landing => {
            router.fallback(forward::handle_forward)
        }
    };

    router
        .layer(DefaultBodyLimit::max(forward::MAX_FORWARD_BODY))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.interceptor),
            intercept,
        ))
        .layer(middleware::from_fn_with_state(
            state.config.environment,
            enforce_https,
        ))
        .with_state(state)
}
