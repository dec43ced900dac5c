// Replay engine: a bounded, capped pass over one id's history using a
// tailing subscription.
//
// Responsibilities
// - Deliver reconstructed events with sequence numbers in [first, last], in
//   order, at most `max` of them, then stop the subscription explicitly.
// - Skip, with a log line, any single event whose payload or metadata does
//   not decode. One bad event never aborts the rest of the replay.
//
// The subscription is the only long-lived resource in the system. It is
// stopped on the terminal conditions below and stops itself when the handle
// drops, which covers error returns and caller cancellation.

use std::sync::Arc;

use crate::application::errors::JournalError;
use crate::core::journal::{EventMetadata, ReplayedEvent};
use crate::core::manifest::DecoderRegistry;
use crate::core::ports::{RecordedEvent, StreamStore};
use crate::core::sequence;
use crate::core::streams::StreamNames;

#[allow(clippy::too_many_arguments)]
pub(crate) async fn replay<E, F>(
    store: &Arc<dyn StreamStore>,
    registry: &Arc<DecoderRegistry<E>>,
    names: &StreamNames,
    persistence_id: &str,
    first_sequence_nr: u64,
    last_sequence_nr: u64,
    max: u64,
    mut on_event: F,
) -> Result<(), JournalError>
where
    E: Send + 'static,
    F: FnMut(ReplayedEvent<E>) + Send,
{
    if max == 0 || last_sequence_nr < first_sequence_nr {
        return Ok(());
    }

    let stream = names.journal(persistence_id);
    let start = sequence::subscription_start(first_sequence_nr);
    let mut subscription = store.subscribe_to_stream(&stream, Some(start)).await?;
    tracing::debug!(%persistence_id, first_sequence_nr, last_sequence_nr, max, "replay started");

    let mut delivered: u64 = 0;
    while let Some(item) = subscription.next().await {
        // A store fault ends the replay; dropping the handle stops the feed.
        let recorded = item?;
        let sequence_nr = sequence::sequence_for_version(recorded.version);
        if sequence_nr < first_sequence_nr {
            continue;
        }
        if sequence_nr > last_sequence_nr {
            break;
        }

        match reconstruct(registry, persistence_id, sequence_nr, &recorded) {
            Ok(event) => {
                on_event(event);
                delivered += 1;
            }
            Err(error) => {
                tracing::warn!(%persistence_id, sequence_nr, %error, "skipping undecodable event during replay");
            }
        }

        if delivered >= max || sequence_nr >= last_sequence_nr {
            break;
        }
    }

    subscription.stop();
    tracing::debug!(%persistence_id, delivered, "replay complete");
    Ok(())
}

fn reconstruct<E>(
    registry: &DecoderRegistry<E>,
    persistence_id: &str,
    sequence_nr: u64,
    recorded: &RecordedEvent,
) -> Result<ReplayedEvent<E>, JournalError> {
    let metadata = EventMetadata::parse(&recorded.metadata).ok_or_else(|| {
        crate::core::manifest::SerializationError::Decode {
            manifest: recorded.event_type.clone(),
            source: anyhow::anyhow!("event metadata is not an adapter document"),
        }
    })?;
    let event = registry.decode(&recorded.event_type, &recorded.data)?;
    Ok(ReplayedEvent {
        persistence_id: persistence_id.to_string(),
        sequence_nr,
        event_type: metadata.event_type,
        sender: metadata.sender,
        tags: metadata.tags,
        timestamp: recorded.created,
        event,
    })
}

#[cfg(test)]
mod replay_engine_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_stream_store::InMemoryStreamStore;
    use crate::application::journal::append;
    use crate::core::journal::JournaledEvent;
    use rstest::{fixture, rstest};
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
    struct Noted {
        n: u64,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestEvent {
        Noted(Noted),
    }

    impl From<Noted> for TestEvent {
        fn from(value: Noted) -> Self {
            TestEvent::Noted(value)
        }
    }

    fn entry(sequence_nr: u64, event_type: &str) -> JournaledEvent {
        JournaledEvent {
            persistence_id: "a".to_string(),
            sequence_nr,
            event_type: event_type.to_string(),
            payload: format!(r#"{{"n":{sequence_nr}}}"#).into_bytes(),
            sender: None,
            tags: BTreeSet::new(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[fixture]
    fn registry() -> Arc<DecoderRegistry<TestEvent>> {
        Arc::new(DecoderRegistry::new().register_json::<Noted>("noted"))
    }

    async fn seed(store: &Arc<dyn StreamStore>, entries: Vec<JournaledEvent>) {
        append::write_batch(store, &StreamNames::default(), entries).await.expect("seed");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_replay_the_requested_range_in_order(registry: Arc<DecoderRegistry<TestEvent>>) {
        let store: Arc<dyn StreamStore> = Arc::new(InMemoryStreamStore::new());
        seed(&store, (1..=5).map(|n| entry(n, "noted")).collect()).await;

        let mut seen = Vec::new();
        replay(&store, &registry, &StreamNames::default(), "a", 2, 4, u64::MAX, |event| {
            seen.push(event.sequence_nr);
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![2, 3, 4]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stop_after_the_cap_and_release_the_subscription(registry: Arc<DecoderRegistry<TestEvent>>) {
        let store: Arc<dyn StreamStore> = Arc::new(InMemoryStreamStore::new());
        seed(&store, (1..=10).map(|n| entry(n, "noted")).collect()).await;

        let mut seen = Vec::new();
        replay(&store, &registry, &StreamNames::default(), "a", 1, 10, 2, |event| {
            seen.push(event.sequence_nr);
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![1, 2]);
        // The feed is stopped, so the in-memory store winds the task down.
        tokio::task::yield_now().await;
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_skip_an_undecodable_event_and_keep_going(registry: Arc<DecoderRegistry<TestEvent>>) {
        let store: Arc<dyn StreamStore> = Arc::new(InMemoryStreamStore::new());
        // Sequence 2 carries a manifest nothing is registered for.
        seed(&store, vec![entry(1, "noted"), entry(2, "unknowable"), entry(3, "noted")]).await;

        let mut seen = Vec::new();
        replay(&store, &registry, &StreamNames::default(), "a", 1, 3, u64::MAX, |event| {
            seen.push(event.sequence_nr);
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![1, 3]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_deliver_nothing_for_a_zero_cap(registry: Arc<DecoderRegistry<TestEvent>>) {
        let store: Arc<dyn StreamStore> = Arc::new(InMemoryStreamStore::new());
        seed(&store, vec![entry(1, "noted")]).await;

        let mut seen: Vec<u64> = Vec::new();
        replay(&store, &registry, &StreamNames::default(), "a", 1, 1, 0, |event| {
            seen.push(event.sequence_nr);
        })
        .await
        .unwrap();

        assert!(seen.is_empty());
    }
}
