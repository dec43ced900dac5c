// Optimistic batch append.
//
// Responsibilities
// - Group a mixed batch by persistence id, derive each group's expected
//   revision from its lowest sequence number, and issue one conditional
//   append per group.
// - Run groups concurrently and await them independently: one group's
//   failure never blocks or rolls back a sibling. Failures aggregate.
//
// A concurrency conflict is reported as a retryable group failure, never
// retried here.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::application::errors::{BatchWriteError, GroupFailure, JournalError};
use crate::core::journal::{EventMetadata, JournaledEvent};
use crate::core::ports::{ProposedEvent, StreamStore};
use crate::core::sequence;
use crate::core::streams::StreamNames;

pub(crate) async fn write_batch(
    store: &Arc<dyn StreamStore>,
    names: &StreamNames,
    entries: Vec<JournaledEvent>,
) -> Result<(), BatchWriteError> {
    let mut groups: HashMap<String, Vec<JournaledEvent>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.persistence_id.clone()).or_default().push(entry);
    }

    let appends = groups.into_iter().map(|(persistence_id, events)| async move {
        match append_group(store, names, &persistence_id, events).await {
            Ok(()) => None,
            Err(error) => {
                tracing::debug!(%persistence_id, %error, "append group rejected");
                Some(GroupFailure { persistence_id, error })
            }
        }
    });

    let failures: Vec<GroupFailure> = join_all(appends).await.into_iter().flatten().collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(BatchWriteError { failures })
    }
}

async fn append_group(
    store: &Arc<dyn StreamStore>,
    names: &StreamNames,
    persistence_id: &str,
    events: Vec<JournaledEvent>,
) -> Result<(), JournalError> {
    // Groups are never empty: every entry carried this id.
    let min_sequence_nr = events.iter().map(|e| e.sequence_nr).min().unwrap_or(1);
    let expected = sequence::expected_revision_for_batch(min_sequence_nr);

    let mut proposed = Vec::with_capacity(events.len());
    for event in &events {
        proposed.push(to_proposed(event)?);
    }

    let stream = names.journal(persistence_id);
    store.append_to_stream(&stream, expected, proposed).await?;
    Ok(())
}

fn to_proposed(event: &JournaledEvent) -> Result<ProposedEvent, JournalError> {
    let metadata = serde_json::to_vec(&EventMetadata::of(event))
        .map_err(crate::core::manifest::SerializationError::Encode)?;
    Ok(ProposedEvent {
        event_id: Uuid::now_v7(),
        event_type: event.event_type.clone(),
        data: event.payload.clone(),
        metadata,
    })
}
