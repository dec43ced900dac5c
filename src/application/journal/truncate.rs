// Truncation manager: soft deletion by advancing the stream's
// truncate-before marker. No physical event removal.
//
// The rewrite preserves every other metadata field and runs under the
// metadata stream's own optimistic concurrency; a conflict surfaces for
// external retry.

use std::sync::Arc;

use crate::application::errors::JournalError;
use crate::core::ports::StreamStore;
use crate::core::sequence;
use crate::core::streams::StreamNames;

pub(crate) async fn delete_messages_to(
    store: &Arc<dyn StreamStore>,
    names: &StreamNames,
    persistence_id: &str,
    to_sequence_nr: u64,
) -> Result<(), JournalError> {
    let stream = names.journal(persistence_id);
    let current = store.get_stream_metadata(&stream).await?;

    let requested = sequence::truncate_before_version(to_sequence_nr);
    // The marker is monotonic: it only ever moves forward.
    let marker = current.metadata.truncate_before.map_or(requested, |existing| existing.max(requested));

    let mut metadata = current.metadata;
    metadata.truncate_before = Some(marker);
    store.set_stream_metadata(&stream, current.version, metadata).await?;
    tracing::debug!(%persistence_id, to_sequence_nr, marker, "truncation marker advanced");
    Ok(())
}

#[cfg(test)]
mod truncation_manager_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_stream_store::InMemoryStreamStore;
    use crate::core::ports::{ExpectedRevision, StreamMetadata};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Arc<dyn StreamStore> {
        Arc::new(InMemoryStreamStore::new())
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_set_the_marker_on_first_deletion(store: Arc<dyn StreamStore>) {
        delete_messages_to(&store, &StreamNames::default(), "a", 5).await.unwrap();
        let current = store.get_stream_metadata("a").await.unwrap();
        assert_eq!(current.metadata.truncate_before, Some(5));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_never_move_the_marker_backwards(store: Arc<dyn StreamStore>) {
        let names = StreamNames::default();
        delete_messages_to(&store, &names, "a", 5).await.unwrap();
        delete_messages_to(&store, &names, "a", 3).await.unwrap();

        let current = store.get_stream_metadata("a").await.unwrap();
        assert_eq!(current.metadata.truncate_before, Some(5));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_preserve_the_other_metadata_fields(store: Arc<dyn StreamStore>) {
        store
            .set_stream_metadata(
                "a",
                ExpectedRevision::NoStream,
                StreamMetadata {
                    max_count: Some(1000),
                    max_age_ms: Some(86_400_000),
                    cache_control_ms: Some(60_000),
                    acl: Some(serde_json::json!({"$r": ["ops"]})),
                    truncate_before: None,
                },
            )
            .await
            .unwrap();

        delete_messages_to(&store, &StreamNames::default(), "a", 7).await.unwrap();

        let current = store.get_stream_metadata("a").await.unwrap();
        assert_eq!(current.metadata.max_count, Some(1000));
        assert_eq!(current.metadata.max_age_ms, Some(86_400_000));
        assert_eq!(current.metadata.cache_control_ms, Some(60_000));
        assert_eq!(current.metadata.acl, Some(serde_json::json!({"$r": ["ops"]})));
        assert_eq!(current.metadata.truncate_before, Some(7));
    }
}
