//! Inbound request handling.
//!
//! # Responsibilities
//! - Pair an inbound request with its translation
//! - Parse inbound form values from the query string
//! - Dump the raw inbound request for diagnostics
//!
//! # Design Decisions
//! - The inbound request stays owned by the translated request so the
//!   body can be streamed upstream without copying
//! - Dumping is the only place the inbound body is ever buffered

use axum::body::{to_bytes, Body};
use axum::http::{request::Parts, Request};

use crate::error::ProxyError;
use crate::routing::Translation;

/// Largest body the diagnostic dump will buffer.
pub const DUMP_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// An inbound request together with its upstream translation.
pub struct TranslatedRequest {
    pub translation: Translation,
    pub parts: Parts,
    pub body: Body,
    /// Decoded query string pairs. Kept for diagnostics only.
    pub form: Vec<(String, String)>,
}

impl TranslatedRequest {
    pub fn new(translation: Translation, request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        let form = parts
            .uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self {
            translation,
            parts,
            body,
            form,
        }
    }
}

/// Log the raw inbound request and hand back an equivalent one.
///
/// The body is buffered up to [`DUMP_BODY_LIMIT`] and replayed.
pub async fn dump_request(request: Request<Body>) -> Result<Request<Body>, ProxyError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, DUMP_BODY_LIMIT)
        .await
        .map_err(|e| ProxyError::RequestConstruction(format!("dump request body: {}", e)))?;

    tracing::info!(target: "logdb_proxy::dump", "{}", render(&parts, &bytes));

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

/// Render a request in HTTP/1.1 wire form.
fn render(parts: &Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut out = format!("{} {} {:?}\r\n", parts.method, target, parts.version);
    for (name, value) in parts.headers.iter() {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}
