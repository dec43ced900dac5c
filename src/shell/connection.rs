// Composition root for the adapter.
//
// Responsibilities
// - Own the single shared store handle: opened lazily exactly once, reused
//   by every operation, torn down only at process shutdown. The cell below
//   is the only piece of process-wide state; components receive the handle
//   explicitly, never through a global.
// - Wire settings and registries into the journal, snapshot and query
//   facades.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::application::journal::Journal;
use crate::application::queries::Queries;
use crate::application::snapshots::SnapshotStore;
use crate::core::manifest::DecoderRegistry;
use crate::core::ports::{StoreError, StreamStore, StreamStoreConnector};
use crate::shell::config::Settings;

pub struct Connection {
    connector: Box<dyn StreamStoreConnector>,
    settings: Settings,
    handle: OnceCell<Arc<dyn StreamStore>>,
}

impl Connection {
    pub fn new(connector: Box<dyn StreamStoreConnector>, settings: Settings) -> Self {
        Self {
            connector,
            settings,
            handle: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared store handle, connecting on first use.
    pub async fn handle(&self) -> Result<Arc<dyn StreamStore>, StoreError> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                tracing::info!("opening stream store connection");
                self.connector.connect().await
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    pub async fn journal<E: Send + 'static>(&self, registry: Arc<DecoderRegistry<E>>) -> Result<Journal<E>, StoreError> {
        Ok(Journal::new(self.handle().await?, registry, self.settings.stream_names()))
    }

    pub async fn snapshot_store<S: Send + 'static>(
        &self,
        registry: Arc<DecoderRegistry<S>>,
    ) -> Result<SnapshotStore<S>, StoreError> {
        Ok(SnapshotStore::new(
            self.handle().await?,
            registry,
            self.settings.stream_names(),
            self.settings.read_batch_size,
        ))
    }

    pub async fn queries<E: Send + 'static>(&self, registry: Arc<DecoderRegistry<E>>) -> Result<Queries<E>, StoreError> {
        Ok(Queries::new(
            self.handle().await?,
            registry,
            self.settings.stream_names(),
            self.settings.read_batch_size,
        ))
    }

    /// Tear the connection down. Live subscriptions end; later calls to
    /// `handle` reuse the closed store and fail at the transport.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.handle.get() {
            tracing::info!("closing stream store connection");
            handle.shutdown().await;
        }
    }
}
