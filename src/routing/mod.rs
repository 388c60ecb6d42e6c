//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → translator.rs (classify into a Route)
//!     → Return: Translation (outbound method + upstream path) or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes are a closed enum, not configuration; only the prefixes are configurable
//! - Immutable after construction (shared without locks)
//! - Deterministic: same input always yields the same translation

pub mod translator;

pub use translator::{PathTranslator, Route, Translation};
