// Error taxonomy for the journal and snapshot operations.
//
// - Conflict: version mismatch on an append or metadata write. Surfaced for
//   external retry, never retried internally.
// - Serialization: propagated for the affected item, except the documented
//   per-event skip during replay.
// - Store: transport or backend fault on the affected call.
// - BatchWriteError: partial multi-id failure; succeeding groups stay
//   durable, there is no compensating rollback.
//
// Not-found is represented as Option/empty results, never as an error.

use thiserror::Error;

use crate::core::manifest::SerializationError;
use crate::core::ports::StoreError;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("version conflict: {0}")]
    Conflict(#[source] StoreError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Store(StoreError),
}

impl JournalError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, JournalError::Conflict(_))
    }
}

impl From<StoreError> for JournalError {
    fn from(error: StoreError) -> Self {
        match error {
            conflict @ StoreError::WrongExpectedVersion { .. } => JournalError::Conflict(conflict),
            other => JournalError::Store(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot payload stream {stream} missing for {persistence_id} at sequence {sequence_nr}")]
    PayloadMissing {
        persistence_id: String,
        sequence_nr: u64,
        stream: String,
    },

    #[error("version conflict: {0}")]
    Conflict(#[source] StoreError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SnapshotError {
    fn from(error: StoreError) -> Self {
        match error {
            conflict @ StoreError::WrongExpectedVersion { .. } => SnapshotError::Conflict(conflict),
            other => SnapshotError::Store(other),
        }
    }
}

/// One rejected group of a multi-id append.
#[derive(Debug)]
pub struct GroupFailure {
    pub persistence_id: String,
    pub error: JournalError,
}

impl GroupFailure {
    /// Retryable concurrency conflict, as opposed to a hard fault.
    pub fn is_conflict(&self) -> bool {
        self.error.is_conflict()
    }
}

/// Aggregated outcome of a batch append where at least one group failed.
/// Groups not listed here committed durably.
#[derive(Debug, Error)]
#[error("{} append group(s) failed", failures.len())]
pub struct BatchWriteError {
    pub failures: Vec<GroupFailure>,
}
