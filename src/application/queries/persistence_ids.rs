// Persistence id discovery from the store's stream-of-streams index.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::errors::JournalError;
use crate::core::ports::StreamStore;
use crate::core::streams::StreamNames;

pub(crate) async fn current_persistence_ids(
    store: &Arc<dyn StreamStore>,
    names: &StreamNames,
) -> Result<BTreeSet<String>, JournalError> {
    let streams = store.stream_names().await?;
    Ok(streams.into_iter().filter(|stream| names.is_persistence_id(stream)).collect())
}

#[cfg(test)]
mod persistence_id_discovery_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_stream_store::InMemoryStreamStore;
    use crate::core::ports::{ExpectedRevision, ProposedEvent};
    use rstest::rstest;
    use uuid::Uuid;

    fn proposed() -> ProposedEvent {
        ProposedEvent {
            event_id: Uuid::now_v7(),
            event_type: "noted".to_string(),
            data: b"{}".to_vec(),
            metadata: Vec::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_journal_streams_and_hide_internal_ones() {
        let store: Arc<dyn StreamStore> = Arc::new(InMemoryStreamStore::new());
        for stream in ["order-0001", "order-0002", "snapshots@order-0001", "snapshot@order-0001@3"] {
            store.append_to_stream(stream, ExpectedRevision::Any, vec![proposed()]).await.unwrap();
        }

        let ids = current_persistence_ids(&store, &StreamNames::default()).await.unwrap();
        assert_eq!(ids, BTreeSet::from(["order-0001".to_string(), "order-0002".to_string()]));
    }
}
