pub mod elastic;
pub mod memory;
pub mod spec;

pub use elastic::ElasticStore;
pub use memory::InMemoryStore;
pub use spec::*;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::models::ServiceDescriptor;
use async_trait::async_trait;
use std::sync::Arc;

/// Boundary to the external index engine.
///
/// The engine is opaque: it stores descriptor documents keyed by id and
/// answers `QuerySpec` requests with scored hits and raw aggregations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Install the index schema if it does not exist yet. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert or overwrite a descriptor document
    async fn put(&self, descriptor: &ServiceDescriptor) -> Result<()>;

    /// Fetch a descriptor by id
    async fn get(&self, id: &str) -> Result<Option<ServiceDescriptor>>;

    /// Delete a descriptor by id; deleting an absent id is success
    async fn delete(&self, id: &str) -> Result<()>;

    /// Execute a query
    async fn query(&self, spec: &QuerySpec) -> Result<QueryOutput>;
}

/// Create a document store from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Elastic => Ok(Arc::new(ElasticStore::new(config)?)),
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    #[test]
    fn test_create_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            url: String::new(),
            index: "test".to_string(),
            timeout_secs: 1,
        };
        assert!(create_store(&config).is_ok());
    }

    #[test]
    fn test_create_elastic_store() {
        let config = StoreConfig {
            backend: StoreBackend::Elastic,
            url: "http://localhost:9200".to_string(),
            index: "test".to_string(),
            timeout_secs: 1,
        };
        assert!(create_store(&config).is_ok());
    }
}
