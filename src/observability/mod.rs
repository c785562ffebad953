//! # Observability
//!
//! Structured logging for the engine and its CLI harness. Every lifecycle
//! operation runs inside a [`lifecycle_span!`](crate::lifecycle_span) span.

pub mod logging;

pub use logging::init_logging;
