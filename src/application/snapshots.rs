// Snapshot store: save, select, load and delete snapshots through the
// per-id metadata chain.
//
// Responsibilities
// - Save appends a descriptor to the chain, then the payload to a
//   version-qualified stream. Both writes must succeed; a descriptor whose
//   payload write failed is a surfaced inconsistency, resolved at load time
//   as PayloadMissing, never silently reconciled.
// - Selection scans the chain backward, newest first, and never touches a
//   payload until a descriptor matched.
// - Deletion removes payload streams only. The chain is append-only by
//   design; its entries stay. That gap is documented, not fixed here.

pub mod chain;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::application::errors::SnapshotError;
use crate::core::manifest::{DecoderRegistry, SerializationError};
use crate::core::ports::{ExpectedRevision, ProposedEvent, ReadEventOutcome, StreamStore};
use crate::core::snapshot::{SelectionCriteria, Snapshot, SnapshotMetadata};
use crate::core::streams::StreamNames;

use self::chain::ChainScan;

/// Manifest of the descriptor records kept in the chain.
pub const CHAIN_ENTRY_TYPE: &str = "snapshot-metadata";

pub struct SnapshotStore<S> {
    store: Arc<dyn StreamStore>,
    registry: Arc<DecoderRegistry<S>>,
    names: StreamNames,
    read_batch_size: usize,
}

impl<S: Send + 'static> SnapshotStore<S> {
    pub fn new(
        store: Arc<dyn StreamStore>,
        registry: Arc<DecoderRegistry<S>>,
        names: StreamNames,
        read_batch_size: usize,
    ) -> Self {
        Self { store, registry, names, read_batch_size }
    }

    /// Record the descriptor in the chain, then write the payload, carrying
    /// the descriptor as the payload event's metadata side-channel. The
    /// chain append tolerates concurrent writers (any prior version).
    pub async fn save(&self, metadata: SnapshotMetadata, manifest: &str, payload: Vec<u8>) -> Result<(), SnapshotError> {
        let descriptor = serde_json::to_vec(&metadata).map_err(SerializationError::Encode)?;

        let chain_stream = self.names.snapshot_chain(&metadata.persistence_id);
        self.store
            .append_to_stream(
                &chain_stream,
                ExpectedRevision::Any,
                vec![ProposedEvent {
                    event_id: Uuid::now_v7(),
                    event_type: CHAIN_ENTRY_TYPE.to_string(),
                    data: descriptor.clone(),
                    metadata: Vec::new(),
                }],
            )
            .await?;

        let payload_stream = self.names.snapshot_payload(&metadata.persistence_id, metadata.sequence_nr);
        self.store
            .append_to_stream(
                &payload_stream,
                ExpectedRevision::Any,
                vec![ProposedEvent {
                    event_id: Uuid::now_v7(),
                    event_type: manifest.to_string(),
                    data: payload,
                    metadata: descriptor,
                }],
            )
            .await?;

        tracing::debug!(persistence_id = %metadata.persistence_id, sequence_nr = metadata.sequence_nr, "snapshot saved");
        Ok(())
    }

    /// Newest snapshot whose descriptor satisfies the criteria's upper
    /// bounds, or `None` when the whole chain has no match.
    pub async fn load(&self, persistence_id: &str, criteria: SelectionCriteria) -> Result<Option<Snapshot<S>>, SnapshotError> {
        let chain_stream = self.names.snapshot_chain(persistence_id);
        let mut scan = ChainScan::new(self.store.as_ref(), chain_stream, self.read_batch_size);
        while let Some(descriptor) = scan.next_entry().await? {
            if criteria.matches_upper(&descriptor) {
                return self.read_payload(descriptor).await.map(Some);
            }
        }
        Ok(None)
    }

    /// Delete the payload streams of every descriptor inside the criteria's
    /// inclusive bounds. Deletions run concurrently; chain entries remain.
    pub async fn delete_matching(&self, persistence_id: &str, criteria: SelectionCriteria) -> Result<(), SnapshotError> {
        let chain_stream = self.names.snapshot_chain(persistence_id);
        let mut scan = ChainScan::new(self.store.as_ref(), chain_stream, self.read_batch_size);

        let mut targets = BTreeSet::new();
        while let Some(descriptor) = scan.next_entry().await? {
            if criteria.matches(&descriptor) {
                targets.insert(self.names.snapshot_payload(persistence_id, descriptor.sequence_nr));
            }
        }

        let deletions = targets
            .iter()
            .map(|stream| self.store.delete_stream(stream, ExpectedRevision::Any));
        for outcome in join_all(deletions).await {
            outcome?;
        }
        tracing::debug!(%persistence_id, deleted = targets.len(), "snapshot payloads deleted");
        Ok(())
    }

    /// Delete every snapshot payload up to and including `max_sequence_nr`.
    pub async fn delete_up_to(&self, persistence_id: &str, max_sequence_nr: u64) -> Result<(), SnapshotError> {
        self.delete_matching(persistence_id, SelectionCriteria::up_to_sequence_nr(max_sequence_nr))
            .await
    }

    async fn read_payload(&self, descriptor: SnapshotMetadata) -> Result<Snapshot<S>, SnapshotError> {
        let stream = self
            .names
            .snapshot_payload(&descriptor.persistence_id, descriptor.sequence_nr);
        match self.store.read_last_event(&stream).await? {
            ReadEventOutcome::Present(recorded) => {
                let payload = self.registry.decode(&recorded.event_type, &recorded.data)?;
                Ok(Snapshot {
                    persistence_id: descriptor.persistence_id,
                    manifest: recorded.event_type,
                    sequence_nr: descriptor.sequence_nr,
                    timestamp: descriptor.timestamp,
                    payload,
                })
            }
            ReadEventOutcome::NoStream | ReadEventOutcome::StreamDeleted => Err(SnapshotError::PayloadMissing {
                persistence_id: descriptor.persistence_id,
                sequence_nr: descriptor.sequence_nr,
                stream,
            }),
        }
    }
}
