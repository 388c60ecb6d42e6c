//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! TranslatedRequest + Credentials
//!     → client.rs (build URL, finalize headers, sign)
//!     → reqwest connection pool
//!     → upstream response (headers received, body still streaming)
//! ```

pub mod client;

pub use client::{ForwardingClient, Prepared, API_VERSION_PREFIX};
