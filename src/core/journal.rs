// Journal event model and the JSON metadata side-channel.
//
// Purpose
// - Carry one durable fact per entry: who wrote it, where it sits in the
//   history, how to decode it later.
//
// Versioning and evolution
// - The metadata document is additive-only. Do not change the meaning of
//   fields already written to a store.
//
// Timestamps
// - All i64 values use the same epoch unit (milliseconds).

use std::collections::BTreeSet;

/// An event handed to the journal for persisting. The payload is already
/// encoded by the domain codec; `event_type` is the manifest the decoder
/// registry resolves on replay. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaledEvent {
    pub persistence_id: String,
    pub sequence_nr: u64,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub sender: Option<String>,
    pub tags: BTreeSet<String>,
    pub timestamp: i64,
}

/// Adapter side-channel stored next to every journal payload so an event can
/// be reconstructed without prior static typing. Records that do not parse as
/// this document (system records, snapshot chain entries) are simply not
/// journal events.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EventMetadata {
    pub event_type: String,
    pub sender: Option<String>,
    pub tags: BTreeSet<String>,
}

impl EventMetadata {
    pub fn of(event: &JournaledEvent) -> Self {
        Self {
            event_type: event.event_type.clone(),
            sender: event.sender.clone(),
            tags: event.tags.clone(),
        }
    }

    /// Lenient parse: `None` for anything that is not an adapter document.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// A reconstructed event delivered to the caller on replay or tag scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedEvent<E> {
    pub persistence_id: String,
    pub sequence_nr: u64,
    pub event_type: String,
    pub sender: Option<String>,
    pub tags: BTreeSet<String>,
    pub timestamp: i64,
    pub event: E,
}

/// A reconstructed event carrying its position in the global append log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent<E> {
    pub global_position: u64,
    pub tag: String,
    pub event: ReplayedEvent<E>,
}
