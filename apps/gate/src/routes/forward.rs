use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

/// Largest request body relayed to the upstream application (10 MiB).
/// Installed on the router as the `DefaultBodyLimit`.
pub const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Fallback for every request the edge layer allowed: relay it to the upstream application.
pub async fn handle_forward(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, AppError> {
    forward(&state, req).await
}

pub async fn forward(state: &AppState, req: Request) -> Result<Response, AppError> {
    let declared_len = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_FORWARD_BODY) {
        return Err(AppError::PayloadTooLarge);
    }

    let method = req.method().clone();
    let uri = req.uri().clone();
    let mut headers = req.headers().clone();
    // Chunked bodies carry no length up front; the limit trips while buffering.
    let body = Bytes::from_request(req, &()).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Internal(anyhow::anyhow!(rejection.body_text()))
        }
    })?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{path_and_query}", state.config.upstream_url);

    strip_hop_by_hop(&mut headers);
    if let Some(host) = headers.remove(header::HOST) {
        headers.insert("x-forwarded-host", host);
    }

    debug!(%method, %url, "Forwarding to upstream");
    let upstream = state
        .http
        .request(method, url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    // The body is re-framed by our own server.
    response_headers.remove(header::CONTENT_LENGTH);
    let bytes = upstream.bytes().await?;

    Ok((status, response_headers, Body::from(bytes)).into_response())
}
