// Ports define what the adapter needs from the backing store, without
// implementing it.
//
// Purpose
// - Describe the stream store as a trait (StreamStore) plus the value types
//   it speaks: recorded events, read outcomes, stream metadata.
//
// Responsibilities
// - Keep the application layer independent of any concrete store or
//   transport by coding against traits.
//
// Boundaries
// - No concrete input or output here. Adapters implement these traits in the
//   adapters layer. Reconnection is the transport's own responsibility; a
//   broken call surfaces as StoreError::Backend.
//
// Testing guidance
// - Provide an in memory implementation for tests and local development.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wrong expected version on {stream}: expected {expected:?}, actual {actual:?}")]
    WrongExpectedVersion {
        stream: String,
        expected: ExpectedRevision,
        actual: Option<u64>,
    },

    #[error("stream {0} has been deleted")]
    StreamDeleted(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Concurrency precondition on appends and metadata writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// The stream must not exist yet.
    NoStream,
    /// The stream's last committed version must be exactly this.
    Exact(u64),
    /// No precondition.
    Any,
}

/// An event proposed for appending. The payload is already encoded by the
/// domain codec; the metadata document is the adapter's JSON side-channel.
#[derive(Debug, Clone)]
pub struct ProposedEvent {
    pub event_id: Uuid,
    pub event_type: String,
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
}

/// An event as recorded by the store.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub stream: String,
    pub event_id: Uuid,
    pub version: u64,
    pub event_type: String,
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
    /// Store-side commit timestamp, epoch milliseconds.
    pub created: i64,
}

/// One page of a per-stream read.
#[derive(Debug, Clone)]
pub struct StreamSlice {
    /// Forward reads: oldest first. Backward reads: newest first.
    pub events: Vec<RecordedEvent>,
    /// Where the next page starts. Meaningless once `is_end_of_stream`.
    pub next_version: u64,
    pub is_end_of_stream: bool,
}

/// Outcome of a per-stream read. Not-found is a state, never an error.
#[derive(Debug, Clone)]
pub enum ReadStreamOutcome {
    Slice(StreamSlice),
    NoStream,
    StreamDeleted,
}

#[derive(Debug, Clone)]
pub enum ReadEventOutcome {
    Present(RecordedEvent),
    NoStream,
    StreamDeleted,
}

/// Starting point of a backward read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFrom {
    End,
    Version(u64),
}

/// One entry of the store's global append log.
#[derive(Debug, Clone)]
pub struct AllEntry {
    pub position: u64,
    pub event: RecordedEvent,
}

#[derive(Debug, Clone)]
pub struct AllSlice {
    pub entries: Vec<AllEntry>,
    pub next_position: u64,
    pub is_end_of_log: bool,
}

/// Stream metadata record. Fields other than `truncate_before` are opaque to
/// the adapter but must be preserved on rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMetadata {
    pub max_count: Option<u64>,
    pub max_age_ms: Option<i64>,
    pub truncate_before: Option<u64>,
    pub cache_control_ms: Option<i64>,
    pub acl: Option<serde_json::Value>,
}

/// Metadata value plus the precondition to use when writing it back.
#[derive(Debug, Clone)]
pub struct VersionedMetadata {
    pub version: ExpectedRevision,
    pub metadata: StreamMetadata,
}

/// Live handle onto a catch-up subscription. The feeding task stops when
/// `stop` is called or the handle is dropped, so the resource is released on
/// every exit path, including cancellation.
pub struct StreamSubscription {
    receiver: mpsc::Receiver<Result<RecordedEvent, StoreError>>,
    stop: watch::Sender<bool>,
}

impl StreamSubscription {
    pub fn new(receiver: mpsc::Receiver<Result<RecordedEvent, StoreError>>, stop: watch::Sender<bool>) -> Self {
        Self { receiver, stop }
    }

    /// Next delivered event. `None` once the feed has stopped.
    pub async fn next(&mut self) -> Option<Result<RecordedEvent, StoreError>> {
        self.receiver.recv().await
    }

    /// Stop the live feed explicitly.
    pub fn stop(self) {
        let _ = self.stop.send(true);
    }
}

#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Conditionally append a batch. The store assigns contiguous versions to
    /// the whole batch atomically or fails without mutating the stream.
    /// Returns the version of the last committed event.
    async fn append_to_stream(
        &self,
        stream: &str,
        expected: ExpectedRevision,
        events: Vec<ProposedEvent>,
    ) -> Result<u64, StoreError>;

    async fn read_stream_forward(&self, stream: &str, from: u64, count: usize)
    -> Result<ReadStreamOutcome, StoreError>;

    async fn read_stream_backward(
        &self,
        stream: &str,
        from: ReadFrom,
        count: usize,
    ) -> Result<ReadStreamOutcome, StoreError>;

    /// The stream's newest event, respecting the truncation marker.
    async fn read_last_event(&self, stream: &str) -> Result<ReadEventOutcome, StoreError>;

    /// Catch-up subscription: recorded events from `from` (0 when `None`),
    /// then live appends as they commit.
    async fn subscribe_to_stream(&self, stream: &str, from: Option<u64>)
    -> Result<StreamSubscription, StoreError>;

    /// Forward batch over the global append log.
    async fn read_all_forward(&self, from: u64, count: usize) -> Result<AllSlice, StoreError>;

    async fn get_stream_metadata(&self, stream: &str) -> Result<VersionedMetadata, StoreError>;

    async fn set_stream_metadata(
        &self,
        stream: &str,
        expected: ExpectedRevision,
        metadata: StreamMetadata,
    ) -> Result<(), StoreError>;

    async fn delete_stream(&self, stream: &str, expected: ExpectedRevision) -> Result<(), StoreError>;

    /// Names in the store's stream-of-streams index, oldest first.
    async fn stream_names(&self) -> Result<Vec<String>, StoreError>;

    /// Tear the connection down. Live subscriptions end after this.
    async fn shutdown(&self);
}

/// Opens the process-wide store handle. Implemented per transport; the shell
/// invokes it lazily, exactly once.
#[async_trait]
pub trait StreamStoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn StreamStore>, StoreError>;
}
