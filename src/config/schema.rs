//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Upstream logdb endpoint and default credentials.
    pub upstream: UpstreamConfig,

    /// Inbound path prefixes.
    pub routing: RoutingConfig,

    /// Add permissive CORS headers to every response.
    pub cross_domain: bool,

    /// Log every inbound request, body included, before forwarding.
    pub dump: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Apply normalizations that do not need validation.
    pub fn normalize(&mut self) {
        if let Some(stripped) = self.upstream.url.strip_suffix('/') {
            self.upstream.url = stripped.to_string();
        }
    }

    /// The `host:port` the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9200,
        }
    }
}

/// Upstream endpoint configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the logdb service, e.g. "https://logdb.example.com".
    pub url: String,

    /// Access key used when the caller sends no credentials.
    pub access_key: String,

    /// Secret key used when the caller sends no credentials.
    pub secret_key: String,

    /// Bound on connection establishment and on waiting for response headers.
    pub response_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn default_credentials(&self) -> Credentials {
        Credentials::new(self.access_key.clone(), self.secret_key.clone())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            response_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("response_timeout_secs", &self.response_timeout_secs)
            .finish()
    }
}

/// Inbound path prefixes, without slashes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix of the Elasticsearch-like API (`/logdb/...`).
    pub api_prefix: String,

    /// Prefix forwarded unchanged (`/logdbkibana/...`).
    pub passthrough_prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: "logdb".to_string(),
            passthrough_prefix: "logdbkibana".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Flat JSON layout accepted for compatibility with older deployments.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LegacyJsonConfig {
    pub port: u16,
    pub cross_domain: bool,
    pub response_timeout: u64,
    #[serde(rename = "logdbHost")]
    pub logdb_host: String,
    pub ak: String,
    pub sk: String,
    pub dump: bool,
}

impl From<LegacyJsonConfig> for ProxyConfig {
    fn from(legacy: LegacyJsonConfig) -> Self {
        let mut config = ProxyConfig::default();
        config.listener.port = legacy.port;
        config.cross_domain = legacy.cross_domain;
        config.dump = legacy.dump;
        config.upstream = UpstreamConfig {
            url: legacy.logdb_host,
            access_key: legacy.ak,
            secret_key: legacy.sk,
            response_timeout_secs: legacy.response_timeout,
        };
        config
    }
}
