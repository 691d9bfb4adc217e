//! Property tests over `CaptureBuffer`'s offset bookkeeping (§8): appends
//! must only ever grow `processed_samples`, and `trim_history` must rebase
//! every counter by the same delta so relative offsets never change.

use proptest::prelude::*;
use voxflow_audio::capture_buffer::{AudioChunk, CaptureBuffer, CaptureLimits};

fn small_limits() -> CaptureLimits {
    CaptureLimits {
        soft_limit_samples: 200,
        hard_limit_samples: 400,
    }
}

proptest! {
    /// Between trims, `processed_samples` only ever moves forward, by
    /// exactly the length of each appended chunk.
    #[test]
    fn processed_samples_is_monotonic_between_trims(chunk_lens in prop::collection::vec(1usize..=64, 1..40)) {
        let mut buf = CaptureBuffer::new(small_limits());
        let mut last = 0usize;

        for len in &chunk_lens {
            buf.append(AudioChunk::new(vec![0.0; *len]));
            let processed = buf.processed_samples();
            prop_assert_eq!(processed, last + len);
            last = processed;
        }
    }

    /// After `trim_history`, every retained chunk is still reachable at its
    /// rebased offset, and slicing the full retained range reproduces the
    /// same tail of samples as before trimming.
    #[test]
    fn trim_history_rebases_without_losing_retained_tail(
        chunk_lens in prop::collection::vec(10usize..=80, 5..20),
    ) {
        let limits = small_limits();
        let mut buf = CaptureBuffer::new(limits);
        for len in &chunk_lens {
            buf.append(AudioChunk::new(vec![1.0; *len]));
            buf.advance_chunk();
        }

        let processed_before = buf.processed_samples();
        let tail_before = buf.slice(
            processed_before.saturating_sub(limits.hard_limit_samples),
            processed_before,
        );

        buf.trim_history();

        let processed_after = buf.processed_samples();
        prop_assert!(processed_after <= processed_before);

        let tail_after = buf.slice(
            processed_after.saturating_sub(limits.hard_limit_samples),
            processed_after,
        );
        prop_assert_eq!(tail_before, tail_after);
    }
}
