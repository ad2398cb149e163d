mod config;
mod credential;
mod edge;
mod errors;
mod redirect;
mod routes;
mod routing;
mod session;
mod state;
mod telemetry;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::routes::build_router;
use crate::session::HttpSessionApi;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; startup fails on missing required env vars
    let config = Config::from_env()?;

    // Logging verbosity follows the deployment environment unless RUST_LOG is set
    telemetry::init(config.environment);

    info!(
        "Starting Profresume gate v{} for the {} application",
        env!("CARGO_PKG_VERSION"),
        config.app
    );
    info!(
        "Routes: public={:?} protected={:?}",
        config.routes.public(),
        config.routes.protected()
    );

    // Upstream forwarding must relay redirects, not follow them
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .context("Failed to build upstream HTTP client")?;

    let session_client = reqwest::Client::builder()
        .timeout(config.verify_timeout)
        .build()
        .context("Failed to build session API client")?;
    let sessions = Arc::new(HttpSessionApi::new(
        session_client,
        config.api_base_url.clone(),
    ));
    info!("Session API at {}", config.api_base_url);

    let port = config.port;
    let state = AppState::new(config, http, sessions);

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
