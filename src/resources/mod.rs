//! Credential lifecycle controllers.
//!
//! One module per credential kind. Each exposes plain async functions taking
//! a [`Session`](crate::client::Session) and a typed configuration, plus a
//! handler that adapts them to the attribute-bag lifecycle contract.

pub mod approle;
pub mod generic_secret;
pub mod pki;

pub use approle::{AppRoleConfig, AppRoleCredential, AppRoleResource};
pub use generic_secret::{GenericSecretDataSource, GenericSecretQuery, GenericSecretSnapshot};
pub use pki::{CertificateConfig, CertificateCredential, CertificateResource};
