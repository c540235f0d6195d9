use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::store::{InMemoryMemberStore, MemberStore, TantivyMemberStore};
use std::sync::Arc;

/// Create a member store based on configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn MemberStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Initializing in-memory member store");
            Ok(Arc::new(InMemoryMemberStore::new()))
        }

        StoreBackend::Tantivy => match &config.index_path {
            Some(path) => {
                tracing::info!(path = ?path, "Initializing Tantivy member store");
                let store = TantivyMemberStore::open(path, config.writer_heap_size)?;
                Ok(Arc::new(store))
            }
            None => {
                tracing::info!("Initializing Tantivy member store in RAM");
                let store = TantivyMemberStore::in_ram(config.writer_heap_size)?;
                Ok(Arc::new(store))
            }
        },
    }
}
