//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{LegacyJsonConfig, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a file.
///
/// `.json` files use the flat legacy layout; everything else is TOML.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    finish(config)
}

/// Parse a TOML document without touching the filesystem.
pub fn parse_toml(content: &str) -> Result<ProxyConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Parse a legacy flat JSON document.
pub fn parse_json(content: &str) -> Result<ProxyConfig, ConfigError> {
    let legacy: LegacyJsonConfig = serde_json::from_str(content).map_err(ConfigError::Json)?;
    Ok(legacy.into())
}

fn finish(mut config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    config.normalize();
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
