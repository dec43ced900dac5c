// Restartable backward scan over a snapshot metadata chain.
//
// Pulls fixed-size batches from the tail, yields descriptors newest first,
// and remembers where the next batch starts, so callers stop mid-scan
// (first match wins) or cancel by dropping the scan.

use std::collections::VecDeque;

use crate::application::errors::SnapshotError;
use crate::core::manifest::SerializationError;
use crate::core::ports::{ReadFrom, ReadStreamOutcome, StreamStore};
use crate::core::snapshot::SnapshotMetadata;

pub(crate) struct ChainScan<'a> {
    store: &'a dyn StreamStore,
    stream: String,
    batch_size: usize,
    cursor: Option<ReadFrom>,
    buffer: VecDeque<SnapshotMetadata>,
}

impl<'a> ChainScan<'a> {
    pub(crate) fn new(store: &'a dyn StreamStore, stream: String, batch_size: usize) -> Self {
        Self {
            store,
            stream,
            batch_size,
            cursor: Some(ReadFrom::End),
            buffer: VecDeque::new(),
        }
    }

    /// Next descriptor, newest first. `None` once the chain is exhausted or
    /// absent. A descriptor that does not parse is propagated for that item.
    pub(crate) async fn next_entry(&mut self) -> Result<Option<SnapshotMetadata>, SnapshotError> {
        loop {
            if let Some(descriptor) = self.buffer.pop_front() {
                return Ok(Some(descriptor));
            }
            let Some(cursor) = self.cursor.take() else {
                return Ok(None);
            };

            match self.store.read_stream_backward(&self.stream, cursor, self.batch_size).await? {
                ReadStreamOutcome::Slice(slice) => {
                    if !slice.is_end_of_stream {
                        self.cursor = Some(ReadFrom::Version(slice.next_version));
                    }
                    for recorded in slice.events {
                        let descriptor =
                            serde_json::from_slice(&recorded.data).map_err(|source| SerializationError::Decode {
                                manifest: recorded.event_type.clone(),
                                source: source.into(),
                            })?;
                        self.buffer.push_back(descriptor);
                    }
                }
                ReadStreamOutcome::NoStream | ReadStreamOutcome::StreamDeleted => return Ok(None),
            }
        }
    }
}
