//! Redirect URL Builder: the one place that encodes a return destination.
//!
//! Every application's interceptor and the admin gate go through this module, so
//! there is exactly one percent-encoding implementation for the `redirect` parameter.

use axum::http::Uri;
use reqwest::Url;
use tracing::debug;

/// Query parameter on the sign-in origin that carries the return destination.
pub const REDIRECT_PARAM: &str = "redirect";

/// Where the visitor was going before being sent to sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectContext {
    destination_origin: String,
    original_path: String,
    original_query: Vec<(String, String)>,
}

impl RedirectContext {
    pub fn new(
        destination_origin: impl Into<String>,
        original_path: impl Into<String>,
        original_query: Vec<(String, String)>,
    ) -> Self {
        let destination_origin: String = destination_origin.into();
        Self {
            destination_origin: destination_origin.trim_end_matches('/').to_string(),
            original_path: original_path.into(),
            original_query,
        }
    }

    /// Builds the context for a request URI. The origin always comes from configuration,
    /// never from the request, so the destination cannot point off-product.
    pub fn from_uri(destination_origin: &str, uri: &Uri) -> Self {
        Self::new(
            destination_origin,
            uri.path(),
            parse_query(uri.query().unwrap_or_default()),
        )
    }

    /// Drops every pair named `name` from the original query.
    pub fn without_param(mut self, name: &str) -> Self {
        self.original_query.retain(|(key, _)| key != name);
        self
    }

    /// Absolute return URL: origin + path, plus the re-encoded query when non-empty.
    pub fn destination(&self) -> String {
        let mut destination = format!("{}{}", self.destination_origin, self.original_path);
        if !self.original_query.is_empty() {
            destination.push('?');
            destination.push_str(&encode_query(&self.original_query));
        }
        destination
    }
}

/// Decodes a raw query string into ordered pairs.
///
/// `+` decodes to a space. Pairs whose decoded bytes are not UTF-8 are dropped rather
/// than forwarded in an ambiguous form.
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            match (decode_component(key), decode_component(value)) {
                (Some(key), Some(value)) => Some((key, value)),
                _ => {
                    debug!("Dropping undecodable query pair");
                    None
                }
            }
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Single canonical encoding pass: each key and value encoded once, order preserved.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Composes the sign-in URL with exactly one `redirect` parameter.
/// Any query or fragment already on `auth_origin` is replaced.
pub fn build_redirect_url(auth_origin: &Url, context: &RedirectContext) -> Url {
    let mut url = auth_origin.clone();
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair(REDIRECT_PARAM, &context.destination());
    url
}
