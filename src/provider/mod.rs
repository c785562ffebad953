//! # Lifecycle Contract
//!
//! The surface the orchestrator drives: Configure once, then Create, Read
//! and Delete per resource, each against an attribute bag and the session
//! produced by Configure.

pub mod attributes;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::client::Session;
use crate::config::ProviderConfig;
use crate::errors::Result;
use crate::resources::{AppRoleResource, CertificateResource, GenericSecretDataSource};

pub use attributes::{AttributeBag, AttributeValue, MapAttributes};

/// A managed resource with a create/read/delete lifecycle.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Type name the orchestrator registers this handler under.
    fn type_name(&self) -> &'static str;

    async fn create(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()>;

    async fn read(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()>;

    async fn delete(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()>;
}

/// A read-only view with no owned lifecycle.
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    async fn read(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()>;
}

/// Registry of resource and data source handlers.
#[derive(Clone)]
pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSourceHandler>>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Provider with every built-in handler registered.
    pub fn new() -> Self {
        let mut provider = Self { resources: BTreeMap::new(), data_sources: BTreeMap::new() };
        provider.register_resource(Arc::new(AppRoleResource));
        provider.register_resource(Arc::new(CertificateResource));
        provider.register_data_source(Arc::new(GenericSecretDataSource));
        provider
    }

    pub fn register_resource(&mut self, handler: Arc<dyn ResourceHandler>) {
        self.resources.insert(handler.type_name(), handler);
    }

    pub fn register_data_source(&mut self, handler: Arc<dyn DataSourceHandler>) {
        self.data_sources.insert(handler.type_name(), handler);
    }

    /// Resolve provider configuration from `bag` and establish the session.
    pub async fn configure(&self, bag: &dyn AttributeBag) -> Result<Session> {
        let config = ProviderConfig::from_attributes(bag)?;
        let session = Session::establish(&config).await?;
        info!(
            resources = ?self.resource_types(),
            data_sources = ?self.data_source_types(),
            "Provider configured"
        );
        Ok(session)
    }

    pub fn resource(&self, type_name: &str) -> Option<&dyn ResourceHandler> {
        self.resources.get(type_name).map(|handler| handler.as_ref())
    }

    pub fn data_source(&self, type_name: &str) -> Option<&dyn DataSourceHandler> {
        self.data_sources.get(type_name).map(|handler| handler.as_ref())
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }
}
