// Journal facade: the write, resolve, replay and truncate operations an
// actor-persistence runtime calls, wired onto a shared stream store handle.
//
// Responsibilities
// - Own no state beyond the store handle, the decoder registry and the
//   stream name mapping. All concurrency control is the store's conditional
//   append.

pub mod append;
pub mod replay;
pub mod sequence_resolver;
pub mod truncate;

use std::sync::Arc;

use crate::application::errors::{BatchWriteError, JournalError};
use crate::core::journal::{JournaledEvent, ReplayedEvent};
use crate::core::manifest::DecoderRegistry;
use crate::core::ports::StreamStore;
use crate::core::streams::StreamNames;

pub struct Journal<E> {
    store: Arc<dyn StreamStore>,
    registry: Arc<DecoderRegistry<E>>,
    names: StreamNames,
}

impl<E: Send + 'static> Journal<E> {
    pub fn new(store: Arc<dyn StreamStore>, registry: Arc<DecoderRegistry<E>>, names: StreamNames) -> Self {
        Self { store, registry, names }
    }

    /// Append a batch possibly spanning several persistence ids. Per-id
    /// groups commit independently and concurrently; the error lists every
    /// rejected group while the others stay durable.
    pub async fn write_batch(&self, entries: Vec<JournaledEvent>) -> Result<(), BatchWriteError> {
        append::write_batch(&self.store, &self.names, entries).await
    }

    /// Highest known sequence number for an id. The `from` hint never lowers
    /// the result. Safe on never-written and fully truncated ids.
    pub async fn highest_sequence_nr(&self, persistence_id: &str, from: u64) -> Result<u64, JournalError> {
        let resolved = sequence_resolver::highest_sequence_nr(&self.store, &self.names, persistence_id).await?;
        Ok(resolved.max(from))
    }

    /// Replay events with sequence numbers in `[first, last]`, at most `max`
    /// of them, in order, invoking `on_event` per reconstructed event.
    pub async fn replay<F>(
        &self,
        persistence_id: &str,
        first_sequence_nr: u64,
        last_sequence_nr: u64,
        max: u64,
        on_event: F,
    ) -> Result<(), JournalError>
    where
        F: FnMut(ReplayedEvent<E>) + Send,
    {
        replay::replay(
            &self.store,
            &self.registry,
            &self.names,
            persistence_id,
            first_sequence_nr,
            last_sequence_nr,
            max,
            on_event,
        )
        .await
    }

    /// Logically delete every event with a sequence number at or below
    /// `to_sequence_nr` by advancing the stream's truncation marker. The
    /// marker never regresses.
    pub async fn delete_messages_to(&self, persistence_id: &str, to_sequence_nr: u64) -> Result<(), JournalError> {
        truncate::delete_messages_to(&self.store, &self.names, persistence_id, to_sequence_nr).await
    }
}
