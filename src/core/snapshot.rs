// Snapshot model: the descriptor kept in the per-id metadata chain, the
// decoded payload envelope, and the selection criteria.
//
// Timestamps
// - All i64 values use the same epoch unit (milliseconds).

/// Descriptor appended to the per-id metadata chain before the payload is
/// written. Selection scans these instead of deserializing payloads.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotMetadata {
    pub persistence_id: String,
    pub sequence_nr: u64,
    pub timestamp: i64,
}

/// A loaded snapshot with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<S> {
    pub persistence_id: String,
    pub manifest: String,
    pub sequence_nr: u64,
    pub timestamp: i64,
    pub payload: S,
}

/// Bounds on snapshot selection and deletion. Every bound is inclusive:
/// `min ≤ x ≤ max` for sequence numbers and timestamps alike. `Default` is
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub max_sequence_nr: u64,
    pub max_timestamp: i64,
    pub min_sequence_nr: u64,
    pub min_timestamp: i64,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            max_sequence_nr: u64::MAX,
            max_timestamp: i64::MAX,
            min_sequence_nr: 0,
            min_timestamp: 0,
        }
    }
}

impl SelectionCriteria {
    pub fn up_to_sequence_nr(max_sequence_nr: u64) -> Self {
        Self { max_sequence_nr, ..Self::default() }
    }

    /// Upper bounds only; selection picks the newest descriptor under them.
    pub fn matches_upper(&self, descriptor: &SnapshotMetadata) -> bool {
        descriptor.sequence_nr <= self.max_sequence_nr && descriptor.timestamp <= self.max_timestamp
    }

    /// All four bounds; deletion by range uses this.
    pub fn matches(&self, descriptor: &SnapshotMetadata) -> bool {
        self.matches_upper(descriptor)
            && descriptor.sequence_nr >= self.min_sequence_nr
            && descriptor.timestamp >= self.min_timestamp
    }
}
