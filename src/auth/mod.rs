//! Caller credentials and upstream request signing.
//!
//! # Data Flow
//! ```text
//! inbound Authorization header
//!     → credentials.rs (parse "<scheme> base64(ak:sk)")
//!     → absent? fall back to configured default pair
//!     → signer.rs (sign finalized outbound request)
//! ```
//!
//! # Design Decisions
//! - "Header absent" and "header invalid" are different outcomes: the first
//!   falls back to defaults, the second fails the request
//! - Signing sits behind a trait so the forwarding client never depends on
//!   a concrete algorithm

pub mod credentials;
pub mod signer;

pub use credentials::{extract_credentials, resolve_credentials, CredentialError, Credentials};
pub use signer::{PandoraSigner, RequestSigner, SignError};
