//! Credential extraction from the inbound `Authorization` header.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// An access key / secret key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

// Keep the secret key out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// A present but malformed `Authorization` header.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid Authorization header: not valid UTF-8")]
    NotUtf8,

    #[error("invalid Authorization header {0}")]
    MissingToken(String),

    #[error("invalid Authorization token: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("invalid ak sk format: decoded token is not valid UTF-8")]
    DecodedNotUtf8,

    #[error("invalid ak sk format")]
    MissingSeparator,
}

/// Parse caller credentials from the request headers.
///
/// Returns `Ok(None)` when no `Authorization` header is present. A header
/// that is present must look like `<scheme> <base64(ak:sk)>`; anything else
/// is an error.
pub fn extract_credentials(headers: &HeaderMap) -> Result<Option<Credentials>, CredentialError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| CredentialError::NotUtf8)?;

    let token = match value.split_once(' ') {
        Some((_scheme, token)) if !token.is_empty() => token,
        _ => return Err(CredentialError::MissingToken(value.to_string())),
    };

    let decoded = STANDARD.decode(token)?;
    let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::DecodedNotUtf8)?;

    let (access_key, secret_key) = decoded
        .split_once(':')
        .ok_or(CredentialError::MissingSeparator)?;

    Ok(Some(Credentials::new(access_key, secret_key)))
}

/// Resolve the credentials to sign with, falling back to `defaults`.
///
/// An absent header, or one carrying an empty access key, uses the default
/// pair. A malformed header is still an error.
pub fn resolve_credentials(
    headers: &HeaderMap,
    defaults: &Credentials,
) -> Result<Credentials, CredentialError> {
    match extract_credentials(headers)? {
        Some(creds) if !creds.access_key.is_empty() => Ok(creds),
        _ => Ok(defaults.clone()),
    }
}
