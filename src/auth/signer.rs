//! Upstream request signing.
//!
//! The signature covers the method, a few entity headers, the `Date`
//! header, any `X-Qiniu-*` headers and the request resource. It must be
//! computed after every other outbound header is final.

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE, DATE},
    HeaderMap, HeaderValue,
};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

use super::Credentials;

type HmacSha1 = Hmac<Sha1>;

const CANONICAL_HEADER_PREFIX: &str = "x-qiniu-";
const CONTENT_MD5: &str = "content-md5";

/// Errors raised while signing an outbound request.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("sign failed: access key or secret key is empty")]
    EmptyCredentials,

    #[error("sign failed: header {0} is not valid UTF-8")]
    InvalidHeader(String),

    #[error("sign failed: invalid secret key")]
    InvalidKey,

    #[error("sign failed: cannot encode Authorization header")]
    InvalidToken,
}

/// Attaches an authentication signature to an outbound request.
pub trait RequestSigner: Send + Sync + std::fmt::Debug {
    /// Mutates `request` in place, typically by setting `Authorization`.
    fn sign(&self, credentials: &Credentials, request: &mut reqwest::Request) -> Result<(), SignError>;
}

/// HMAC-SHA1 signer for the Pandora logdb API.
#[derive(Debug, Clone, Default)]
pub struct PandoraSigner;

impl PandoraSigner {
    pub fn new() -> Self {
        Self
    }

    /// Build the string-to-sign for a request.
    fn string_to_sign(
        method: &str,
        resource: &str,
        headers: &HeaderMap,
    ) -> Result<String, SignError> {
        let mut data = String::with_capacity(128);
        data.push_str(method);
        data.push('\n');
        data.push_str(header_str(headers, CONTENT_MD5)?);
        data.push('\n');
        data.push_str(header_str(headers, CONTENT_TYPE.as_str())?);
        data.push('\n');
        data.push_str(header_str(headers, DATE.as_str())?);
        data.push('\n');

        // HeaderMap names are already lowercase.
        let mut canonical: Vec<(&str, &str)> = Vec::new();
        for name in headers.keys() {
            let name = name.as_str();
            if name.len() > CANONICAL_HEADER_PREFIX.len() && name.starts_with(CANONICAL_HEADER_PREFIX) {
                canonical.push((name, header_str(headers, name)?));
            }
        }
        canonical.sort_unstable();
        for (name, value) in canonical {
            data.push_str(name);
            data.push(':');
            data.push_str(value);
            data.push('\n');
        }

        data.push_str(resource);
        Ok(data)
    }

    /// Compute the URL-safe base64 HMAC-SHA1 of `data` keyed by `secret_key`.
    fn signature(secret_key: &str, data: &str) -> Result<String, SignError> {
        let mut mac =
            HmacSha1::new_from_slice(secret_key.as_bytes()).map_err(|_| SignError::InvalidKey)?;
        mac.update(data.as_bytes());
        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }
}

impl RequestSigner for PandoraSigner {
    fn sign(&self, credentials: &Credentials, request: &mut reqwest::Request) -> Result<(), SignError> {
        if credentials.access_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(SignError::EmptyCredentials);
        }

        let url = request.url();
        let resource = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let data = Self::string_to_sign(request.method().as_str(), &resource, request.headers())?;
        let signature = Self::signature(&credentials.secret_key, &data)?;

        let token = format!("Pandora {}:{}", credentials.access_key, signature);
        let value = HeaderValue::from_str(&token).map_err(|_| SignError::InvalidToken)?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, SignError> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map_err(|_| SignError::InvalidHeader(name.to_string())),
        None => Ok(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    fn request(method: Method, url: &str) -> reqwest::Request {
        let mut req = reqwest::Request::new(method, Url::parse(url).unwrap());
        let headers = req.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(DATE, HeaderValue::from_static("Mon, 02 Jan 2006 15:04:05 GMT"));
        req
    }

    #[test]
    fn test_string_to_sign_layout() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(DATE, HeaderValue::from_static("Mon, 02 Jan 2006 15:04:05 GMT"));
        headers.insert("x-qiniu-b", HeaderValue::from_static("2"));
        headers.insert("x-qiniu-a", HeaderValue::from_static("1"));
        headers.insert("x-other", HeaderValue::from_static("ignored"));

        let data = PandoraSigner::string_to_sign("POST", "/v5/msearch", &headers).unwrap();
        assert_eq!(
            data,
            "POST\n\ntext/plain\nMon, 02 Jan 2006 15:04:05 GMT\nx-qiniu-a:1\nx-qiniu-b:2\n/v5/msearch"
        );
    }

    #[test]
    fn test_sign_sets_authorization() {
        let mut req = request(Method::POST, "http://logdb.example.com/v5/msearch");
        let creds = Credentials::new("ak", "sk");
        PandoraSigner::new().sign(&creds, &mut req).unwrap();

        let auth = req.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(auth.starts_with("Pandora ak:"));
        // 20-byte digest → 28 padded base64 characters.
        assert_eq!(auth.len(), "Pandora ak:".len() + 28);
    }

    #[test]
    fn test_signature_is_deterministic_and_key_dependent() {
        let signer = PandoraSigner::new();
        let mut a = request(Method::GET, "http://logdb.example.com/v5/repo/stats");
        let mut b = request(Method::GET, "http://logdb.example.com/v5/repo/stats");
        let mut c = request(Method::GET, "http://logdb.example.com/v5/repo/stats");
        signer.sign(&Credentials::new("ak", "sk"), &mut a).unwrap();
        signer.sign(&Credentials::new("ak", "sk"), &mut b).unwrap();
        signer.sign(&Credentials::new("ak", "other"), &mut c).unwrap();

        assert_eq!(a.headers().get(AUTHORIZATION), b.headers().get(AUTHORIZATION));
        assert_ne!(a.headers().get(AUTHORIZATION), c.headers().get(AUTHORIZATION));
    }

    #[test]
    fn test_signature_covers_path() {
        let signer = PandoraSigner::new();
        let creds = Credentials::new("ak", "sk");
        let mut stats = request(Method::GET, "http://logdb.example.com/v5/repo/stats");
        let mut mapping = request(Method::GET, "http://logdb.example.com/v5/repo/mapping");
        signer.sign(&creds, &mut stats).unwrap();
        signer.sign(&creds, &mut mapping).unwrap();
        assert_ne!(
            stats.headers().get(AUTHORIZATION),
            mapping.headers().get(AUTHORIZATION)
        );
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let mut req = request(Method::GET, "http://logdb.example.com/v5/repo/stats");
        let err = PandoraSigner::new()
            .sign(&Credentials::new("", ""), &mut req)
            .unwrap_err();
        assert!(matches!(err, SignError::EmptyCredentials));
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }
}
