// Highest-sequence resolution. Recovery resumes from this value, so the
// resolver must be safe on never-written ids and on fully truncated ones.

use std::sync::Arc;

use crate::application::errors::JournalError;
use crate::core::ports::{ReadEventOutcome, StreamStore};
use crate::core::sequence;
use crate::core::streams::StreamNames;

/// Tail event present: its version, offset-translated. Stream not found
/// (never written, or everything truncated away): the truncation marker,
/// which under the offset rule is the highest truncated sequence number, or
/// 0 when there is none. Any other terminal status: 0.
pub(crate) async fn highest_sequence_nr(
    store: &Arc<dyn StreamStore>,
    names: &StreamNames,
    persistence_id: &str,
) -> Result<u64, JournalError> {
    let stream = names.journal(persistence_id);
    match store.read_last_event(&stream).await? {
        ReadEventOutcome::Present(tail) => Ok(sequence::sequence_for_version(tail.version)),
        ReadEventOutcome::NoStream => {
            let current = store.get_stream_metadata(&stream).await?;
            Ok(current.metadata.truncate_before.unwrap_or(0))
        }
        ReadEventOutcome::StreamDeleted => Ok(0),
    }
}
