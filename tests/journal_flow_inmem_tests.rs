// End to end journal flow against the in memory store.
//
// Covers the write/resolve/replay/truncate cycle through the shell wiring:
// appends with optimistic concurrency, highest-sequence resolution, ordered
// capped replay, and soft deletion via the truncation marker.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::{fixture, rstest};

use stream_journal::adapters::in_memory::in_memory_connector::InMemoryConnector;
use stream_journal::application::journal::Journal;
use stream_journal::core::journal::JournaledEvent;
use stream_journal::core::manifest::DecoderRegistry;
use stream_journal::shell::config::Settings;
use stream_journal::shell::connection::Connection;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct ItemAdded {
    item: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderEvent {
    ItemAdded(ItemAdded),
}

impl From<ItemAdded> for OrderEvent {
    fn from(value: ItemAdded) -> Self {
        OrderEvent::ItemAdded(value)
    }
}

fn registry() -> Arc<DecoderRegistry<OrderEvent>> {
    Arc::new(DecoderRegistry::new().register_json::<ItemAdded>("item-added"))
}

fn entry(persistence_id: &str, sequence_nr: u64) -> JournaledEvent {
    let payload = serde_json::to_vec(&ItemAdded { item: format!("item-{sequence_nr}") }).unwrap();
    JournaledEvent {
        persistence_id: persistence_id.to_string(),
        sequence_nr,
        event_type: "item-added".to_string(),
        payload,
        sender: None,
        tags: BTreeSet::new(),
        timestamp: 1_700_000_000_000,
    }
}

#[fixture]
fn connection() -> Connection {
    stream_journal::shell::telemetry::init();
    Connection::new(Box::new(InMemoryConnector::new()), Settings::default())
}

async fn journal(connection: &Connection) -> Journal<OrderEvent> {
    connection.journal(registry()).await.expect("wire journal")
}

#[rstest]
#[tokio::test]
async fn it_should_resolve_and_replay_everything_that_was_appended(connection: Connection) {
    let journal = journal(&connection).await;
    journal
        .write_batch((1..=5).map(|n| entry("order-1", n)).collect())
        .await
        .expect("append five events");

    assert_eq!(journal.highest_sequence_nr("order-1", 0).await.unwrap(), 5);

    let mut replayed = Vec::new();
    journal
        .replay("order-1", 1, 5, 5, |event| replayed.push(event))
        .await
        .unwrap();

    let sequence_nrs: Vec<u64> = replayed.iter().map(|e| e.sequence_nr).collect();
    assert_eq!(sequence_nrs, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        replayed[0].event,
        OrderEvent::ItemAdded(ItemAdded { item: "item-1".to_string() })
    );
    assert_eq!(replayed[0].event_type, "item-added");
}

#[rstest]
#[tokio::test]
async fn it_should_keep_the_resolved_sequence_stable_without_writes(connection: Connection) {
    let journal = journal(&connection).await;
    journal.write_batch(vec![entry("order-1", 1), entry("order-1", 2)]).await.unwrap();

    let first = journal.highest_sequence_nr("order-1", 0).await.unwrap();
    let second = journal.highest_sequence_nr("order-1", 0).await.unwrap();
    let third = journal.highest_sequence_nr("order-1", 0).await.unwrap();
    assert_eq!((first, second, third), (2, 2, 2));
}

#[rstest]
#[tokio::test]
async fn it_should_let_exactly_one_concurrent_writer_win(connection: Connection) {
    let journal = journal(&connection).await;
    journal.write_batch(vec![entry("order-1", 1)]).await.unwrap();

    // Both writers resume from sequence 1 and race for version 0.
    let left = journal.write_batch(vec![entry("order-1", 2)]);
    let right = journal.write_batch(vec![entry("order-1", 2)]);
    let (left, right) = tokio::join!(left, right);

    let winners = [&left, &right].iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1, "exactly one writer must win");
    let rejected = if left.is_err() { left.unwrap_err() } else { right.unwrap_err() };
    assert!(rejected.failures[0].is_conflict());
}

#[rstest]
#[tokio::test]
async fn it_should_stop_replay_at_the_cap_and_terminate(connection: Connection) {
    let journal = journal(&connection).await;
    journal
        .write_batch((1..=10).map(|n| entry("order-1", n)).collect())
        .await
        .unwrap();

    let mut replayed = Vec::new();
    journal
        .replay("order-1", 1, 10, 2, |event| replayed.push(event.sequence_nr))
        .await
        .unwrap();

    assert_eq!(replayed, vec![1, 2]);
}

#[rstest]
#[tokio::test]
async fn it_should_keep_the_truncation_marker_monotonic(connection: Connection) {
    let journal = journal(&connection).await;
    journal
        .write_batch((1..=10).map(|n| entry("order-1", n)).collect())
        .await
        .unwrap();

    journal.delete_messages_to("order-1", 5).await.unwrap();
    journal.delete_messages_to("order-1", 3).await.unwrap();

    // The marker stayed at 5: replay resumes at sequence 6.
    let mut replayed = Vec::new();
    journal
        .replay("order-1", 1, 10, 10, |event| replayed.push(event.sequence_nr))
        .await
        .unwrap();
    assert_eq!(replayed, vec![6, 7, 8, 9, 10]);
}

#[rstest]
#[tokio::test]
async fn it_should_resolve_truncated_and_missing_ids_safely(connection: Connection) {
    let journal = journal(&connection).await;

    assert_eq!(journal.highest_sequence_nr("never-written", 0).await.unwrap(), 0);

    journal
        .write_batch((1..=5).map(|n| entry("order-1", n)).collect())
        .await
        .unwrap();
    journal.delete_messages_to("order-1", 5).await.unwrap();

    // Fully truncated: the id resolves to its marker, not 0.
    assert_eq!(journal.highest_sequence_nr("order-1", 0).await.unwrap(), 5);
}

#[rstest]
#[tokio::test]
async fn it_should_stop_accepting_writes_after_shutdown() {
    let connector = InMemoryConnector::new();
    let store = connector.store();
    let connection = Connection::new(Box::new(connector), Settings::default());

    let journal = journal(&connection).await;
    journal.write_batch(vec![entry("order-1", 1)]).await.unwrap();

    connection.shutdown().await;

    let rejected = journal
        .write_batch(vec![entry("order-1", 2)])
        .await
        .expect_err("the closed connection must reject writes");
    assert!(!rejected.failures[0].is_conflict());

    // What was written before the teardown is still there.
    use stream_journal::core::ports::{ReadEventOutcome, StreamStore};
    match store.read_last_event("order-1").await.unwrap() {
        ReadEventOutcome::Present(tail) => assert_eq!(tail.version, 0),
        other => panic!("expected the committed event, got {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn it_should_report_only_the_failing_group_of_a_mixed_batch(connection: Connection) {
    let journal = journal(&connection).await;
    journal.write_batch(vec![entry("order-1", 1)]).await.unwrap();

    let rejected = journal
        .write_batch(vec![entry("order-1", 1), entry("order-2", 1)])
        .await
        .expect_err("the stale group must be reported");
    assert_eq!(rejected.failures.len(), 1);
    assert_eq!(rejected.failures[0].persistence_id, "order-1");

    // The sibling group committed durably.
    assert_eq!(journal.highest_sequence_nr("order-2", 0).await.unwrap(), 1);
}
