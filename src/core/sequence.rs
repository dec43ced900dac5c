// The one conversion rule between caller sequence numbers and store versions.
//
// Purpose
// - Sequence numbers are caller-assigned, 1-based and contiguous per
//   persistence id. Stream versions are store-assigned and 0-based. Every
//   translation between the two lives here: `version = sequence - 1`.
//
// Boundaries
// - No input or output. Pure arithmetic only.

use crate::core::ports::ExpectedRevision;

/// Store version holding the event with the given sequence number.
pub fn version_for_sequence(sequence_nr: u64) -> u64 {
    sequence_nr.saturating_sub(1)
}

/// Sequence number of the event recorded at the given store version.
pub fn sequence_for_version(version: u64) -> u64 {
    version + 1
}

/// Concurrency precondition for a batch whose lowest entry carries
/// `min_sequence_nr`: the stream must end exactly where the batch begins.
pub fn expected_revision_for_batch(min_sequence_nr: u64) -> ExpectedRevision {
    if min_sequence_nr <= 1 {
        ExpectedRevision::NoStream
    } else {
        ExpectedRevision::Exact(version_for_sequence(min_sequence_nr) - 1)
    }
}

/// Version a replay subscription starts from. One event before the requested
/// range so the catch-up join with the live feed is seamless; earlier events
/// are filtered out by the replay engine.
pub fn subscription_start(first_sequence_nr: u64) -> u64 {
    first_sequence_nr.saturating_sub(2)
}

/// Truncate-before marker that logically deletes every event with a sequence
/// number at or below `to_sequence_nr`: the version of the first retained
/// event. Under the offset rule this equals `to_sequence_nr` itself, which is
/// why a fully truncated stream resolves its highest sequence number straight
/// from the marker.
pub fn truncate_before_version(to_sequence_nr: u64) -> u64 {
    version_for_sequence(to_sequence_nr.saturating_add(1))
}

#[cfg(test)]
mod sequence_conversion_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 1)]
    fn it_should_translate_sequence_to_version_at_boundaries(#[case] sequence_nr: u64, #[case] version: u64) {
        assert_eq!(version_for_sequence(sequence_nr), version);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(2, 3)]
    fn it_should_translate_version_to_sequence_at_boundaries(#[case] version: u64, #[case] sequence_nr: u64) {
        assert_eq!(sequence_for_version(version), sequence_nr);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(1_000_000)]
    fn it_should_round_trip_sequence_numbers(#[case] sequence_nr: u64) {
        assert_eq!(sequence_for_version(version_for_sequence(sequence_nr)), sequence_nr);
    }

    #[rstest]
    fn it_should_expect_no_stream_for_a_fresh_history() {
        assert_eq!(expected_revision_for_batch(1), ExpectedRevision::NoStream);
    }

    #[rstest]
    #[case(2, 0)]
    #[case(3, 1)]
    #[case(10, 8)]
    fn it_should_expect_the_version_of_the_last_durable_event(#[case] min_sequence_nr: u64, #[case] version: u64) {
        assert_eq!(expected_revision_for_batch(min_sequence_nr), ExpectedRevision::Exact(version));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 0)]
    #[case(5, 3)]
    fn it_should_start_subscriptions_one_event_early(#[case] first: u64, #[case] start: u64) {
        assert_eq!(subscription_start(first), start);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(5, 5)]
    fn it_should_place_the_marker_on_the_first_retained_version(#[case] to: u64, #[case] marker: u64) {
        assert_eq!(truncate_before_version(to), marker);
    }
}
