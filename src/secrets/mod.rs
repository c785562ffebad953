//! Handling of sensitive values.
//!
//! Nothing that the backend hands out only once (secret IDs, private keys) and
//! no session credential is ever logged in cleartext. Those values travel
//! through the engine as [`SecretString`].

pub mod types;

pub use types::SecretString;
