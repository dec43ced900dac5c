// Tag index scan: repeated fixed-size forward batches over the global log,
// filtered to events whose metadata tag set contains the target tag.
//
// Cost is O(total global events) from the given start. Records without an
// adapter metadata document (system records, snapshot chain entries) never
// match. A decode failure on a matching event is propagated as that item;
// the scan continues behind it.

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;

use crate::application::errors::JournalError;
use crate::core::journal::{EventMetadata, ReplayedEvent, TaggedEvent};
use crate::core::manifest::DecoderRegistry;
use crate::core::ports::{AllEntry, StreamStore};
use crate::core::sequence;

pub(crate) fn events_by_tag<E: Send + 'static>(
    store: Arc<dyn StreamStore>,
    registry: Arc<DecoderRegistry<E>>,
    tag: String,
    from_position: u64,
    batch_size: usize,
) -> impl Stream<Item = Result<TaggedEvent<E>, JournalError>> {
    stream! {
        let mut position = from_position;
        loop {
            let slice = match store.read_all_forward(position, batch_size).await {
                Ok(slice) => slice,
                Err(error) => {
                    yield Err(JournalError::from(error));
                    break;
                }
            };

            for entry in slice.entries {
                let Some(metadata) = EventMetadata::parse(&entry.event.metadata) else {
                    continue;
                };
                if !metadata.tags.contains(&tag) {
                    continue;
                }
                yield reconstruct(&registry, &tag, metadata, entry);
            }

            if slice.is_end_of_log {
                break;
            }
            position = slice.next_position;
        }
    }
}

fn reconstruct<E>(
    registry: &DecoderRegistry<E>,
    tag: &str,
    metadata: EventMetadata,
    entry: AllEntry,
) -> Result<TaggedEvent<E>, JournalError> {
    let event = registry.decode(&entry.event.event_type, &entry.event.data)?;
    Ok(TaggedEvent {
        global_position: entry.position,
        tag: tag.to_string(),
        event: ReplayedEvent {
            persistence_id: entry.event.stream.clone(),
            sequence_nr: sequence::sequence_for_version(entry.event.version),
            event_type: metadata.event_type,
            sender: metadata.sender,
            tags: metadata.tags,
            timestamp: entry.event.created,
            event,
        },
    })
}
