// Query facade: cross-entity reads over the store's global append log and
// its stream-of-streams index.

pub mod persistence_ids;
pub mod tagged;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::Stream;

use crate::application::errors::JournalError;
use crate::core::journal::TaggedEvent;
use crate::core::manifest::DecoderRegistry;
use crate::core::ports::StreamStore;
use crate::core::streams::StreamNames;

pub struct Queries<E> {
    store: Arc<dyn StreamStore>,
    registry: Arc<DecoderRegistry<E>>,
    names: StreamNames,
    read_batch_size: usize,
}

impl<E: Send + 'static> Queries<E> {
    pub fn new(
        store: Arc<dyn StreamStore>,
        registry: Arc<DecoderRegistry<E>>,
        names: StreamNames,
        read_batch_size: usize,
    ) -> Self {
        Self { store, registry, names, read_batch_size }
    }

    /// Lazy forward scan of the global log, yielding events whose tag set
    /// contains `tag`, in global order. Callers wanting a resumable feed
    /// persist the last `global_position` and pass it back as `from`.
    pub fn events_by_tag(
        &self,
        tag: &str,
        from_position: u64,
    ) -> impl Stream<Item = Result<TaggedEvent<E>, JournalError>> + use<E> {
        tagged::events_by_tag(
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            tag.to_string(),
            from_position,
            self.read_batch_size,
        )
    }

    /// All persistence ids known to the store.
    pub async fn current_persistence_ids(&self) -> Result<BTreeSet<String>, JournalError> {
        persistence_ids::current_persistence_ids(&self.store, &self.names).await
    }
}
