use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::config::Environment;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Returns the `https://` equivalent of a request the proxy reports as plain `http`.
/// `None` when the request is already encrypted or the host is unknown. The host comes
/// from the `Host` header, else from the request target's authority.
pub fn upgrade_target(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let proto = headers.get(FORWARDED_PROTO)?.to_str().ok()?;
    // Proxy chains append; the first hop is the client-facing one.
    let first_hop = proto.split(',').next().unwrap_or_default().trim();
    if !first_hop.eq_ignore_ascii_case("http") {
        return None;
    }

    // HTTP/2 carries the host in `:authority` rather than a Host header.
    let host = match headers.get(header::HOST) {
        Some(value) => value.to_str().ok()?,
        None => uri.authority()?.as_str(),
    }
    .trim();
    if host.is_empty() {
        return None;
    }
    let host = host.strip_suffix(":80").unwrap_or(host);

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Some(format!("https://{host}{path_and_query}"))
}

/// Permanently redirects plaintext traffic to HTTPS. Production only.
pub async fn enforce_https(
    State(environment): State<Environment>,
    req: Request,
    next: Next,
) -> Response {
    if !environment.is_production() {
        return next.run(req).await;
    }

    match upgrade_target(req.headers(), req.uri()) {
        Some(target) => {
            debug!(%target, "Upgrading plaintext request");
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response()
        }
        None => next.run(req).await,
    }
}
