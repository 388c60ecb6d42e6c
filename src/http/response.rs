//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn an upstream response into the caller's response
//! - Propagate the upstream request id header
//! - Provide the fixed CORS header set
//!
//! # Design Decisions
//! - Only the status, `X-Reqid` and body are relayed; other upstream
//!   headers are dropped
//! - Streaming responses avoid buffering entire body

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderName, HeaderValue,
    },
    response::Response,
};

use crate::http::relay::relay;

/// Request id header set by the upstream.
pub const X_REQID: HeaderName = HeaderName::from_static("x-reqid");

/// Headers stamped on every response when cross-domain access is enabled.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(
                "Authorization,Origin, X-Requested-With, Content-Type, Accept, X-Appid",
            ),
        ),
        (
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, GET, OPTIONS, PUT, DELETE"),
        ),
        (CONTENT_TYPE, HeaderValue::from_static("application/json")),
    ]
}

/// Build the caller's response from an upstream response.
pub fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let request_id = upstream.headers().get(&X_REQID).cloned();

    let mut response = Response::new(Body::from_stream(relay(upstream.bytes_stream())));
    *response.status_mut() = status;
    if let Some(request_id) = request_id {
        response.headers_mut().insert(X_REQID, request_id);
    }
    response
}
