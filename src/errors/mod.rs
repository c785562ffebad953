//! # Error Handling
//!
//! Error taxonomy for the credential lifecycle engine. Transport problems are
//! described by [`TlsError`] and surface as configuration errors.

mod tls;
mod types;

pub use tls::TlsError;
pub use types::{Error, Operation, Result};
