// Stream identity mapping: persistence id to physical stream names.
//
// Persisted layout
// - One primary journal stream per id; the id is the stream name.
// - One snapshot metadata chain per id under `snapshots@`.
// - One versioned payload stream per saved snapshot under `snapshot@`.
// - Store-maintained system streams start with `$`; `$streams` enumerates
//   every stream for id discovery.

pub const DEFAULT_CHAIN_PREFIX: &str = "snapshots@";
pub const DEFAULT_PAYLOAD_PREFIX: &str = "snapshot@";

#[derive(Debug, Clone)]
pub struct StreamNames {
    chain_prefix: String,
    payload_prefix: String,
}

impl Default for StreamNames {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_PREFIX, DEFAULT_PAYLOAD_PREFIX)
    }
}

impl StreamNames {
    pub fn new(chain_prefix: impl Into<String>, payload_prefix: impl Into<String>) -> Self {
        Self {
            chain_prefix: chain_prefix.into(),
            payload_prefix: payload_prefix.into(),
        }
    }

    /// Primary journal stream for a persistence id.
    pub fn journal(&self, persistence_id: &str) -> String {
        persistence_id.to_string()
    }

    /// Append-only metadata chain indexing an id's saved snapshots.
    pub fn snapshot_chain(&self, persistence_id: &str) -> String {
        format!("{}{persistence_id}", self.chain_prefix)
    }

    /// Version-qualified stream holding one snapshot payload.
    pub fn snapshot_payload(&self, persistence_id: &str, sequence_nr: u64) -> String {
        format!("{}{persistence_id}@{sequence_nr}", self.payload_prefix)
    }

    /// Whether an entry of the stream-of-streams index names a persistence
    /// id, as opposed to a system stream or one of ours.
    pub fn is_persistence_id(&self, stream: &str) -> bool {
        !stream.starts_with('$')
            && !stream.starts_with(&self.chain_prefix)
            && !stream.starts_with(&self.payload_prefix)
    }
}
