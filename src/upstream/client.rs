//! Outbound HTTP client for the logdb upstream.
//!
//! # Responsibilities
//! - Join the upstream base URL, API version and translated path
//! - Finalize outbound headers, then sign
//! - Stream the inbound body upstream without buffering
//! - Bound connect and response-header wait by the response timeout
//!
//! # Design Decisions
//! - Exactly one attempt per inbound request; failures are not retried
//! - Inbound headers are not forwarded, except a known Content-Length
//! - The header-wait clock starts once the request body is fully sent, so a
//!   slow upload is never charged against the response timeout
//! - The body relay back to the caller is not covered by the timeout

use std::sync::Arc;
use std::time::Duration;

use axum::body::HttpBody;
use axum::http::{
    header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, DATE},
    HeaderValue,
};
use futures_util::{stream, Stream, StreamExt};
use reqwest::Url;
use tokio::sync::oneshot;

use crate::auth::{Credentials, RequestSigner};
use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::request::TranslatedRequest;

/// Version prefix of every upstream operation.
pub const API_VERSION_PREFIX: &str = "/v5";

/// Content type stamped on every outbound request.
const UPSTREAM_CONTENT_TYPE: &str = "text/plain";

/// Issues translated, signed requests to the upstream.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    client: reqwest::Client,
    base_url: String,
    response_timeout: Duration,
    signer: Arc<dyn RequestSigner>,
}

impl ForwardingClient {
    /// Build a client from upstream configuration.
    pub fn new(config: &UpstreamConfig, signer: Arc<dyn RequestSigner>) -> Result<Self, reqwest::Error> {
        let response_timeout = config.response_timeout();
        let client = reqwest::Client::builder()
            .connect_timeout(response_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            response_timeout,
            signer,
        })
    }

    /// Full upstream URL for a translated path.
    ///
    /// The resolved path must stay under the API version prefix.
    pub fn upstream_url(&self, upstream_path: &str) -> Result<Url, ProxyError> {
        let raw = format!("{}{}{}", self.base_url, API_VERSION_PREFIX, upstream_path);
        let url = Url::parse(&raw)
            .map_err(|e| ProxyError::RequestConstruction(format!("{}: {}", raw, e)))?;

        let scoped = url
            .path()
            .strip_prefix(API_VERSION_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'));
        if !scoped {
            return Err(ProxyError::RequestConstruction(format!(
                "{} resolves outside {}",
                raw, API_VERSION_PREFIX
            )));
        }
        Ok(url)
    }

    /// Build and sign the outbound request.
    pub fn prepare(
        &self,
        translated: TranslatedRequest,
        credentials: &Credentials,
    ) -> Result<Prepared, ProxyError> {
        let url = self.upstream_url(&translated.translation.upstream_path)?;
        let TranslatedRequest {
            translation,
            parts,
            body,
            ..
        } = translated;
        let (uploaded_tx, uploaded) = oneshot::channel();

        let mut request = reqwest::Request::new(translation.method, url);

        let headers = request.headers_mut();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(UPSTREAM_CONTENT_TYPE));
        headers.insert(DATE, http_date()?);

        if !body.is_end_stream() {
            if let Some(length) = parts.headers.get(CONTENT_LENGTH) {
                headers.insert(CONTENT_LENGTH, length.clone());
            }
            let tracked = track_upload(body.into_data_stream(), uploaded_tx);
            *request.body_mut() = Some(reqwest::Body::wrap_stream(tracked));
        } else {
            let _ = uploaded_tx.send(());
        }

        // Must run last: the signature covers the header state above.
        self.signer.sign(credentials, &mut request)?;
        Ok(Prepared {
            route: translation.route.kind(),
            request,
            uploaded,
        })
    }

    /// Send a translated request upstream and wait for response headers.
    pub async fn forward(
        &self,
        translated: TranslatedRequest,
        credentials: &Credentials,
    ) -> Result<reqwest::Response, ProxyError> {
        let Prepared {
            route,
            request,
            uploaded,
        } = self.prepare(translated, credentials)?;

        tracing::debug!(
            route,
            method = %request.method(),
            url = %request.url(),
            "Forwarding request upstream"
        );

        let execute = self.client.execute(request);
        tokio::pin!(execute);

        // Connect is bounded by the client's connect timeout. The upload
        // itself runs unbounded.
        tokio::select! {
            result = &mut execute => return result.map_err(|e| ProxyError::Upstream(e.to_string())),
            _ = uploaded => {}
        }

        match tokio::time::timeout(self.response_timeout, execute).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ProxyError::Upstream(e.to_string())),
            Err(_) => Err(ProxyError::Upstream(format!(
                "upstream did not respond within {}s",
                self.response_timeout.as_secs()
            ))),
        }
    }
}

/// A signed outbound request, ready to send.
#[derive(Debug)]
pub struct Prepared {
    pub route: &'static str,
    pub request: reqwest::Request,
    /// Resolves once the request body has been handed off in full, or the
    /// body stream was abandoned.
    pub uploaded: oneshot::Receiver<()>,
}

/// Pass a body stream through, firing `done` when it ends.
///
/// If the stream is dropped before its end, `done` is dropped with it and
/// the receiver still resolves.
fn track_upload<S, T>(body: S, done: oneshot::Sender<()>) -> impl Stream<Item = T> + Send + 'static
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    stream::unfold((Box::pin(body), Some(done)), |(mut body, mut done)| async move {
        match body.next().await {
            Some(item) => Some((item, (body, done))),
            None => {
                if let Some(done) = done.take() {
                    let _ = done.send(());
                }
                None
            }
        }
    })
}

/// Current UTC time in IMF-fixdate form.
fn http_date() -> Result<HeaderValue, ProxyError> {
    let now = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    HeaderValue::from_str(&now).map_err(|e| ProxyError::RequestConstruction(e.to_string()))
}
