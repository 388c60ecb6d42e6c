//! Per-request error taxonomy.
//!
//! Every failure detected while handling a request is turned into an HTTP
//! response at the point of detection. Nothing here escapes the handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{CredentialError, SignError};

/// Errors surfaced to the caller of the proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No routing rule matched the inbound method and path.
    #[error("No route for {0}")]
    RouteNotFound(String),

    /// The `Authorization` header was present but malformed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The outbound request could not be built (bad URL, oversized dump body).
    #[error("{0}")]
    RequestConstruction(String),

    /// The signer refused the outbound request.
    #[error(transparent)]
    Signing(#[from] SignError),

    /// Transport failure or timeout while talking to the upstream.
    #[error("{0}")]
    Upstream(String),
}

impl ProxyError {
    /// Status code reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Credential(_)
            | ProxyError::RequestConstruction(_)
            | ProxyError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::RouteNotFound(_) => "route_not_found",
            ProxyError::Credential(_) => "credential",
            ProxyError::RequestConstruction(_) => "request_construction",
            ProxyError::Signing(_) => "signing",
            ProxyError::Upstream(_) => "upstream",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
