// In memory implementation of the StreamStore port.
//
// Purpose
// - Support the application-layer tests and local development without a
//   backing store.
//
// Responsibilities
// - Enforce the store-side contract the adapter relies on: atomic
//   conditional appends, truncation-aware reads, catch-up subscriptions,
//   metadata versioning, the global append log and the stream-of-streams
//   index.
//
// Truncated and deleted events stay visible in the global log, like a real
// store before a scavenge pass.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, mpsc, watch};

use crate::core::ports::{
    AllEntry, AllSlice, ExpectedRevision, ProposedEvent, ReadEventOutcome, ReadFrom, ReadStreamOutcome,
    RecordedEvent, StoreError, StreamMetadata, StreamSlice, StreamStore, StreamSubscription, VersionedMetadata,
};

const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Clone, Default)]
pub struct InMemoryStreamStore {
    shared: Arc<Shared>,
}

struct Shared {
    inner: RwLock<Inner>,
    /// Bumped on every commit so subscription tasks re-read their stream.
    /// A watch channel keeps a version, so a pulse between a state read and
    /// the wait is never lost.
    pulse: watch::Sender<u64>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            inner: RwLock::default(),
            pulse: watch::channel(0).0,
        }
    }
}

impl Shared {
    fn tick(&self) {
        self.pulse.send_modify(|tick| *tick += 1);
    }
}

#[derive(Default)]
struct Inner {
    streams: HashMap<String, StreamState>,
    /// Insertion-order index, the `$streams` equivalent.
    names: Vec<String>,
    /// Global append log; position is the index.
    all: Vec<RecordedEvent>,
    closed: bool,
}

#[derive(Default)]
struct StreamState {
    /// Version equals the index; truncation never removes entries.
    events: Vec<RecordedEvent>,
    hard_deleted: bool,
    indexed: bool,
    metadata: StreamMetadata,
    metadata_version: Option<u64>,
}

impl StreamState {
    fn floor(&self) -> u64 {
        self.metadata.truncate_before.unwrap_or(0)
    }

    fn current_revision(&self) -> Option<u64> {
        self.events.last().map(|event| event.version)
    }

    fn fully_truncated(&self) -> bool {
        self.events.is_empty() || self.floor() > self.current_revision().unwrap_or(0)
    }
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_expected(
    stream: &str,
    expected: ExpectedRevision,
    actual: Option<u64>,
) -> Result<(), StoreError> {
    let satisfied = match expected {
        ExpectedRevision::NoStream => actual.is_none(),
        ExpectedRevision::Exact(version) => actual == Some(version),
        ExpectedRevision::Any => true,
    };
    if satisfied {
        Ok(())
    } else {
        Err(StoreError::WrongExpectedVersion {
            stream: stream.to_string(),
            expected,
            actual,
        })
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn append_to_stream(
        &self,
        stream: &str,
        expected: ExpectedRevision,
        events: Vec<ProposedEvent>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.shared.inner.write().await;
        if inner.closed {
            return Err(StoreError::Backend("store is shut down".to_string()));
        }

        let (last_version, newly_indexed, committed) = {
            let state = inner.streams.entry(stream.to_string()).or_default();
            if state.hard_deleted {
                return Err(StoreError::StreamDeleted(stream.to_string()));
            }
            check_expected(stream, expected, state.current_revision())?;
            if events.is_empty() {
                return Ok(state.current_revision().unwrap_or(0));
            }

            let created = Utc::now().timestamp_millis();
            let mut committed = Vec::with_capacity(events.len());
            for proposed in events {
                let recorded = RecordedEvent {
                    stream: stream.to_string(),
                    event_id: proposed.event_id,
                    version: state.events.len() as u64,
                    event_type: proposed.event_type,
                    data: proposed.data,
                    metadata: proposed.metadata,
                    created,
                };
                state.events.push(recorded.clone());
                committed.push(recorded);
            }
            let last_version = state.current_revision().unwrap_or(0);
            let newly_indexed = !std::mem::replace(&mut state.indexed, true);
            (last_version, newly_indexed, committed)
        };

        if newly_indexed {
            inner.names.push(stream.to_string());
        }
        inner.all.extend(committed);
        drop(inner);

        self.shared.tick();
        Ok(last_version)
    }

    async fn read_stream_forward(
        &self,
        stream: &str,
        from: u64,
        count: usize,
    ) -> Result<ReadStreamOutcome, StoreError> {
        let inner = self.shared.inner.read().await;
        let Some(state) = inner.streams.get(stream) else {
            return Ok(ReadStreamOutcome::NoStream);
        };
        if state.hard_deleted {
            return Ok(ReadStreamOutcome::StreamDeleted);
        }
        if state.fully_truncated() {
            return Ok(ReadStreamOutcome::NoStream);
        }

        let len = state.events.len() as u64;
        let start = from.max(state.floor());
        let end = (start + count as u64).min(len);
        let events = if start >= len {
            Vec::new()
        } else {
            state.events[start as usize..end as usize].to_vec()
        };
        Ok(ReadStreamOutcome::Slice(StreamSlice {
            events,
            next_version: end,
            is_end_of_stream: end >= len,
        }))
    }

    async fn read_stream_backward(
        &self,
        stream: &str,
        from: ReadFrom,
        count: usize,
    ) -> Result<ReadStreamOutcome, StoreError> {
        let inner = self.shared.inner.read().await;
        let Some(state) = inner.streams.get(stream) else {
            return Ok(ReadStreamOutcome::NoStream);
        };
        if state.hard_deleted {
            return Ok(ReadStreamOutcome::StreamDeleted);
        }
        if state.fully_truncated() {
            return Ok(ReadStreamOutcome::NoStream);
        }

        let newest = state.current_revision().unwrap_or(0);
        let floor = state.floor();
        let start = match from {
            ReadFrom::End => newest,
            ReadFrom::Version(version) => version.min(newest),
        };
        if start < floor {
            return Ok(ReadStreamOutcome::Slice(StreamSlice {
                events: Vec::new(),
                next_version: 0,
                is_end_of_stream: true,
            }));
        }

        let oldest = start.saturating_sub(count.max(1) as u64 - 1).max(floor);
        let mut events = state.events[oldest as usize..=start as usize].to_vec();
        events.reverse();
        Ok(ReadStreamOutcome::Slice(StreamSlice {
            events,
            next_version: oldest.saturating_sub(1),
            is_end_of_stream: oldest <= floor,
        }))
    }

    async fn read_last_event(&self, stream: &str) -> Result<ReadEventOutcome, StoreError> {
        let inner = self.shared.inner.read().await;
        let Some(state) = inner.streams.get(stream) else {
            return Ok(ReadEventOutcome::NoStream);
        };
        if state.hard_deleted {
            return Ok(ReadEventOutcome::StreamDeleted);
        }
        if state.fully_truncated() {
            return Ok(ReadEventOutcome::NoStream);
        }
        Ok(match state.events.last() {
            Some(tail) => ReadEventOutcome::Present(tail.clone()),
            None => ReadEventOutcome::NoStream,
        })
    }

    async fn subscribe_to_stream(
        &self,
        stream: &str,
        from: Option<u64>,
    ) -> Result<StreamSubscription, StoreError> {
        let shared = Arc::clone(&self.shared);
        let stream = stream.to_string();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut cursor = from.unwrap_or(0);
            let mut pulse_rx = shared.pulse.subscribe();
            loop {
                if *stop_rx.borrow() {
                    break;
                }
                // Mark the pulse seen before reading, so a commit landing
                // between the read and the wait is never missed.
                pulse_rx.borrow_and_update();
                let batch = {
                    let inner = shared.inner.read().await;
                    if inner.closed {
                        break;
                    }
                    match inner.streams.get(&stream) {
                        Some(state) if state.hard_deleted => {
                            let _ = tx.send(Err(StoreError::StreamDeleted(stream.clone()))).await;
                            return;
                        }
                        Some(state) => {
                            if cursor < state.floor() {
                                cursor = state.floor();
                            }
                            state
                                .events
                                .get(cursor as usize..)
                                .map(<[RecordedEvent]>::to_vec)
                                .unwrap_or_default()
                        }
                        None => Vec::new(),
                    }
                };

                if batch.is_empty() {
                    tokio::select! {
                        _ = pulse_rx.changed() => {}
                        changed = stop_rx.changed() => {
                            if changed.is_err() || *stop_rx.borrow() {
                                break;
                            }
                        }
                    }
                    continue;
                }

                for event in batch {
                    cursor = event.version + 1;
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(StreamSubscription::new(rx, stop_tx))
    }

    async fn read_all_forward(&self, from: u64, count: usize) -> Result<AllSlice, StoreError> {
        let inner = self.shared.inner.read().await;
        let len = inner.all.len() as u64;
        let start = from.min(len);
        let end = (start + count as u64).min(len);
        let entries = inner.all[start as usize..end as usize]
            .iter()
            .enumerate()
            .map(|(offset, event)| AllEntry {
                position: start + offset as u64,
                event: event.clone(),
            })
            .collect();
        Ok(AllSlice {
            entries,
            next_position: end,
            is_end_of_log: end >= len,
        })
    }

    async fn get_stream_metadata(&self, stream: &str) -> Result<VersionedMetadata, StoreError> {
        let inner = self.shared.inner.read().await;
        Ok(match inner.streams.get(stream) {
            Some(state) => VersionedMetadata {
                version: state.metadata_version.map_or(ExpectedRevision::NoStream, ExpectedRevision::Exact),
                metadata: state.metadata.clone(),
            },
            None => VersionedMetadata {
                version: ExpectedRevision::NoStream,
                metadata: StreamMetadata::default(),
            },
        })
    }

    async fn set_stream_metadata(
        &self,
        stream: &str,
        expected: ExpectedRevision,
        metadata: StreamMetadata,
    ) -> Result<(), StoreError> {
        let mut inner = self.shared.inner.write().await;
        if inner.closed {
            return Err(StoreError::Backend("store is shut down".to_string()));
        }
        let state = inner.streams.entry(stream.to_string()).or_default();
        check_expected(stream, expected, state.metadata_version)?;
        state.metadata_version = Some(state.metadata_version.map_or(0, |version| version + 1));
        state.metadata = metadata;
        drop(inner);

        self.shared.tick();
        Ok(())
    }

    async fn delete_stream(&self, stream: &str, expected: ExpectedRevision) -> Result<(), StoreError> {
        let mut inner = self.shared.inner.write().await;
        if inner.closed {
            return Err(StoreError::Backend("store is shut down".to_string()));
        }
        let Some(state) = inner.streams.get_mut(stream) else {
            // Deleting what was never written is a no-op.
            return Ok(());
        };
        check_expected(stream, expected, state.current_revision())?;
        state.hard_deleted = true;
        state.events.clear();
        state.indexed = false;
        inner.names.retain(|name| name != stream);
        drop(inner);

        self.shared.tick();
        Ok(())
    }

    async fn stream_names(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.shared.inner.read().await;
        Ok(inner.names.clone())
    }

    async fn shutdown(&self) {
        let mut inner = self.shared.inner.write().await;
        inner.closed = true;
        drop(inner);
        self.shared.tick();
    }
}
