//! Inbound path translation.
//!
//! # Responsibilities
//! - Classify an inbound (method, path) into one of a fixed set of routes
//! - Produce the outbound method and upstream path for that route
//! - Reject everything else with an explicit no-match
//!
//! # Design Decisions
//! - Rules are checked in a fixed priority order, first match wins
//! - Segment counts are exact and matching is case-sensitive
//! - Query strings never influence routing
//! - Paths with dot segments, plain or percent-encoded, never match

use axum::http::Method;

use crate::config::RoutingConfig;
use crate::error::ProxyError;

/// Multi-search marker segment.
pub const MSEARCH_MARKER: &str = "_msearch";
/// Index stats marker segment.
pub const STATS_MARKER: &str = "_stats";
/// Index mapping marker segment.
pub const MAPPING_MARKER: &str = "_mapping";

/// Upstream multi-search operation path.
pub const MSEARCH_PATH: &str = "/msearch";

/// The upstream operation an inbound request maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Forwarded unchanged under the pass-through prefix.
    PassThrough,
    /// Batched search.
    MultiSearch,
    /// Index statistics.
    IndexStats { index: String },
    /// Index field mapping.
    IndexMapping { index: String },
}

impl Route {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Route::PassThrough => "passthrough",
            Route::MultiSearch => "msearch",
            Route::IndexStats { .. } => "stats",
            Route::IndexMapping { .. } => "mapping",
        }
    }
}

/// Result of translating an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub route: Route,
    pub method: Method,
    pub upstream_path: String,
}

/// Maps inbound requests onto upstream operations.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    api_prefix: String,
    passthrough_prefix: String,
}

impl PathTranslator {
    /// Build a translator for the given prefixes (without slashes).
    pub fn new(api_prefix: impl Into<String>, passthrough_prefix: impl Into<String>) -> Self {
        Self {
            api_prefix: format!("/{}/", api_prefix.into()),
            passthrough_prefix: format!("/{}/", passthrough_prefix.into()),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.api_prefix.clone(), config.passthrough_prefix.clone())
    }

    /// Translate an inbound method and path.
    pub fn translate(&self, method: &Method, path: &str) -> Result<Translation, ProxyError> {
        let route = self
            .classify(method, path)
            .ok_or_else(|| ProxyError::RouteNotFound(path.to_string()))?;

        let (method, upstream_path) = match &route {
            Route::PassThrough => (method.clone(), path.to_string()),
            // The upstream only accepts POST for multi-search.
            Route::MultiSearch => (Method::POST, MSEARCH_PATH.to_string()),
            Route::IndexStats { index } => (method.clone(), format!("/{}/stats", index)),
            Route::IndexMapping { index } => (method.clone(), format!("/{}/mapping", index)),
        };

        Ok(Translation {
            route,
            method,
            upstream_path,
        })
    }

    fn classify(&self, method: &Method, path: &str) -> Option<Route> {
        if !is_clean_path(path) {
            return None;
        }
        if path.starts_with(&self.passthrough_prefix) {
            return Some(Route::PassThrough);
        }
        if !path.starts_with(&self.api_prefix) {
            return None;
        }

        // "/logdb/a/b" → ["logdb", "a", "b"]
        let segments: Vec<&str> = path[1..].split('/').collect();
        match (method, segments.as_slice()) {
            (&Method::POST | &Method::GET, [_, marker]) if *marker == MSEARCH_MARKER => {
                Some(Route::MultiSearch)
            }
            (&Method::GET, [_, index, marker]) if !index.is_empty() => match *marker {
                STATS_MARKER => Some(Route::IndexStats {
                    index: index.to_string(),
                }),
                MAPPING_MARKER => Some(Route::IndexMapping {
                    index: index.to_string(),
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

/// True when no segment is a dot segment, plain or percent-encoded.
///
/// Backslashes count as separators because URL parsing treats them as `/`
/// for http(s) URLs.
fn is_clean_path(path: &str) -> bool {
    !path.split(['/', '\\']).any(is_dot_segment)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | ".%2e" | "%2e." | "%2e%2e"
    )
}
