//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS and trace layers)
//!     → request.rs (optional dump, pair request with its translation)
//!     → [routing decides the upstream operation]
//!     → [upstream client signs and sends]
//!     → response.rs + relay.rs (status, X-Reqid, streamed body)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::TranslatedRequest;
pub use response::X_REQID;
pub use server::{AppState, HttpServer};
