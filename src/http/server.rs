//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, CORS response headers)
//! - Bind server to listener
//! - Dispatch requests through translation, credentials and forwarding
//! - Relay upstream responses back to the caller

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::auth::{resolve_credentials, Credentials, PandoraSigner, RequestSigner};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{dump_request, TranslatedRequest};
use crate::http::response::{cors_headers, relay_response};
use crate::lifecycle::{signals, ShutdownSignal};
use crate::observability::metrics;
use crate::routing::{PathTranslator, Translation};
use crate::upstream::ForwardingClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub translator: Arc<PathTranslator>,
    pub upstream: ForwardingClient,
    pub default_credentials: Arc<Credentials>,
}

impl AppState {
    /// Build handler state with the given signer.
    pub fn new(config: ProxyConfig, signer: Arc<dyn RequestSigner>) -> Result<Self, reqwest::Error> {
        let upstream = ForwardingClient::new(&config.upstream, signer)?;
        Ok(Self {
            translator: Arc::new(PathTranslator::from_config(&config.routing)),
            default_credentials: Arc::new(config.upstream.default_credentials()),
            config: Arc::new(config),
            upstream,
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server signing with [`PandoraSigner`].
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        Self::with_signer(config, Arc::new(PandoraSigner::new()))
    }

    /// Create a new HTTP server with a custom signer.
    pub fn with_signer(
        config: ProxyConfig,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, reqwest::Error> {
        let state = AppState::new(config, signer)?;
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state);

        if config.cross_domain {
            for (name, value) in cors_headers() {
                router = router.layer(SetResponseHeaderLayer::overriding(name, value));
            }
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Run the server until Ctrl+C or until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            cross_domain = self.config.cross_domain,
            dump = self.config.dump,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::ctrl_c() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the proxy without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Translates the path, resolves credentials, and forwards upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(method = %method, path = %path, "Proxying request");

    let translation = state
        .translator
        .translate(request.method(), request.uri().path());
    let route = translation
        .as_ref()
        .map_or(metrics::UNROUTED, |t| t.route.kind());

    match forward(&state, translation, request).await {
        Ok(response) => {
            metrics::record_request(route, response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            let status = e.status_code();
            match &e {
                ProxyError::RouteNotFound(_) => {
                    tracing::warn!(method = %method, path = %path, "No route matched")
                }
                _ => tracing::error!(
                    method = %method,
                    path = %path,
                    route,
                    kind = e.kind(),
                    error = %e,
                    "Request failed"
                ),
            }
            metrics::record_error(e.kind());
            metrics::record_request(route, status.as_u16(), start_time);
            e.into_response()
        }
    }
}

/// Dump (when enabled) precedes the routing verdict so unroutable
/// requests are still logged.
async fn forward(
    state: &AppState,
    translation: Result<Translation, ProxyError>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let request = if state.config.dump {
        dump_request(request).await?
    } else {
        request
    };

    let translation = translation?;
    let credentials = resolve_credentials(request.headers(), &state.default_credentials)?;

    let translated = TranslatedRequest::new(translation, request);
    tracing::trace!(
        route = translated.translation.route.kind(),
        form = ?translated.form,
        "Request translated"
    );

    let upstream = state.upstream.forward(translated, &credentials).await?;
    Ok(relay_response(upstream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use tower::ServiceExt;

    fn config(cross_domain: bool) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        // Nothing listens here; only requests that fail before the upstream
        // call are exercised.
        config.upstream.url = "http://127.0.0.1:1".into();
        config.upstream.access_key = "ak".into();
        config.upstream.secret_key = "sk".into();
        config.cross_domain = cross_domain;
        config
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let server = HttpServer::new(config(false)).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/logdb/repo/_search")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "No route for /logdb/repo/_search");
    }

    #[tokio::test]
    async fn test_malformed_authorization_is_500() {
        let server = HttpServer::new(config(false)).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/logdb/repo/_stats")
                    .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("nocolon")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "invalid ak sk format");
    }

    #[tokio::test]
    async fn test_cors_headers_applied_when_enabled() {
        let server = HttpServer::new(config(true)).unwrap();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "POST, GET, OPTIONS, PUT, DELETE"
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_cors_headers_absent_when_disabled() {
        let server = HttpServer::new(config(false)).unwrap();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_encoded_dot_segments_never_reach_upstream() {
        let server = HttpServer::new(config(false)).unwrap();
        for (method, uri) in [
            ("GET", "/logdb/../_stats"),
            ("GET", "/logdb/%2e%2e/_mapping"),
            ("DELETE", "/logdbkibana/%2e%2e/%2e%2e/admin/users"),
        ] {
            let response = server
                .router()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn test_malformed_upstream_url_is_500() {
        let mut config = config(false);
        config.upstream.url = "http://[::1".into();
        let server = HttpServer::new(config).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logdb/_msearch")
                    .body(Body::from("{}\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
