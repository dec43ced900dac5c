// Connector handing out an in memory store, for tests and local development.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::in_memory::in_memory_stream_store::InMemoryStreamStore;
use crate::core::ports::{StoreError, StreamStore, StreamStoreConnector};

#[derive(Clone, Default)]
pub struct InMemoryConnector {
    store: InMemoryStreamStore,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same store every connect hands out, for seeding and assertions.
    pub fn store(&self) -> InMemoryStreamStore {
        self.store.clone()
    }
}

#[async_trait]
impl StreamStoreConnector for InMemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn StreamStore>, StoreError> {
        Ok(Arc::new(self.store.clone()))
    }
}
