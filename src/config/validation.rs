//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check the upstream URL scheme and prefix shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream url should start with 'http://' or 'https://', got '{0}'")]
    UpstreamScheme(String),

    #[error("listener port must not be 0")]
    ZeroPort,

    #[error("upstream response timeout must be greater than 0")]
    ZeroTimeout,

    #[error("{field} must be a non-empty path segment without '/', got '{value}'")]
    InvalidPrefix { field: &'static str, value: String },

    #[error("api_prefix and passthrough_prefix must differ")]
    DuplicatePrefix,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let url = &config.upstream.url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ValidationError::UpstreamScheme(url.clone()));
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let prefixes = [
        ("api_prefix", &config.routing.api_prefix),
        ("passthrough_prefix", &config.routing.passthrough_prefix),
    ];
    for (field, value) in prefixes {
        if value.is_empty() || value.contains('/') {
            errors.push(ValidationError::InvalidPrefix {
                field,
                value: value.clone(),
            });
        }
    }

    if config.routing.api_prefix == config.routing.passthrough_prefix {
        errors.push(ValidationError::DuplicatePrefix);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
