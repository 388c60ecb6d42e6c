//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind listener → Serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C or Shutdown::trigger → Stop accepting → Drain in-flight → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No reload: configuration changes require a restart

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
