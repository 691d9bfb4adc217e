//! Session-scoped capture buffer: owns every sample captured for the
//! current dictation session and exposes slicing + bounded-memory trimming
//! for the segmenter and flow supervisor.
//!
//! Single-writer (audio producer thread appends), single-reader (segmenter
//! and supervisor slice/snapshot) — the same shared-resource shape as
//! [`crate::ring_buffer::AudioRingBuffer`], but chunk-oriented rather than
//! frame-oriented since downstream consumers need to slice by absolute
//! sample offset.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A contiguous block of mono f32 PCM, appended once and never mutated.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Soft/hard chunk-length thresholds the segmenter uses to force a cut
/// even without silence (samples, at the declared sample rate).
#[derive(Debug, Clone, Copy)]
pub struct CaptureLimits {
    pub soft_limit_samples: usize,
    pub hard_limit_samples: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            // 16kHz: ~15s soft, ~30s hard.
            soft_limit_samples: 240_000,
            hard_limit_samples: 480_000,
        }
    }
}

struct ChunkEntry {
    chunk: AudioChunk,
    /// Absolute sample offset (pre-trim numbering) where this chunk starts.
    start_sample: usize,
}

/// Ordered sequence of [`AudioChunk`]s plus the counters the supervisor and
/// segmenter snapshot. See the struct-level doc on thread ownership: this
/// type is not `Sync`-by-construction — it's wrapped behind a lock by
/// whichever single reader needs it (segmenter or supervisor), matching
/// `AudioRingBuffer`'s split-producer/consumer approach but without the
/// realtime lock-free requirement since slicing is not on the hot path.
pub struct CaptureBuffer {
    chunks: VecDeque<ChunkEntry>,
    processed_samples: AtomicUsize,
    chunk_start_sample: AtomicUsize,
    last_segment_end_sample: AtomicUsize,
    segment_count: AtomicUsize,
    limits: CaptureLimits,
}

impl CaptureBuffer {
    pub fn new(limits: CaptureLimits) -> Self {
        Self {
            chunks: VecDeque::new(),
            processed_samples: AtomicUsize::new(0),
            chunk_start_sample: AtomicUsize::new(0),
            last_segment_end_sample: AtomicUsize::new(0),
            segment_count: AtomicUsize::new(0),
            limits,
        }
    }

    pub fn processed_samples(&self) -> usize {
        self.processed_samples.load(Ordering::SeqCst)
    }

    pub fn chunk_start_sample(&self) -> usize {
        self.chunk_start_sample.load(Ordering::SeqCst)
    }

    pub fn last_segment_end_sample(&self) -> usize {
        self.last_segment_end_sample.load(Ordering::SeqCst)
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count.load(Ordering::SeqCst)
    }

    /// Records `chunk`, increments `processed_samples`.
    pub fn append(&mut self, chunk: AudioChunk) {
        let start = self.processed_samples.load(Ordering::SeqCst);
        let len = chunk.len();
        self.chunks.push_back(ChunkEntry {
            chunk,
            start_sample: start,
        });
        self.processed_samples.fetch_add(len, Ordering::SeqCst);
    }

    /// Zero-gap concatenation across internal chunks for `[start, end)`.
    /// Out-of-range bounds clamp to what's retained.
    pub fn slice(&self, start: usize, end: usize) -> Vec<f32> {
        let processed = self.processed_samples();
        let end = end.min(processed);
        if start >= end || self.chunks.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(end - start);
        for entry in &self.chunks {
            let chunk_start = entry.start_sample;
            let chunk_end = chunk_start + entry.chunk.len();
            if chunk_end <= start || chunk_start >= end {
                continue;
            }
            let lo = start.saturating_sub(chunk_start);
            let hi = (end - chunk_start).min(entry.chunk.len());
            out.extend_from_slice(&entry.chunk.samples[lo..hi]);
        }
        out
    }

    /// `slice(chunk_start_sample, processed_samples)`.
    pub fn current_chunk(&self) -> Vec<f32> {
        self.slice(self.chunk_start_sample(), self.processed_samples())
    }

    /// `slice(last_segment_end_sample, processed_samples)`, or `None` if
    /// nothing has been captured since the last segment ended.
    pub fn tail_since_last_segment(&self) -> Option<Vec<f32>> {
        let start = self.last_segment_end_sample();
        let end = self.processed_samples();
        if start >= end {
            None
        } else {
            Some(self.slice(start, end))
        }
    }

    /// `slice(0, processed_samples)` — the entire session's audio so far.
    pub fn full_since_session_start(&self) -> Vec<f32> {
        self.slice(0, self.processed_samples())
    }

    pub fn at_soft_limit(&self) -> bool {
        self.current_chunk().len() >= self.limits.soft_limit_samples
    }

    pub fn at_hard_limit(&self) -> bool {
        self.current_chunk().len() >= self.limits.hard_limit_samples
    }

    /// Called by the segmenter when a span is emitted as a segment:
    /// advances `chunk_start_sample` to the current write head and trims
    /// history no longer needed by any future slice.
    pub fn advance_chunk(&mut self) {
        let processed = self.processed_samples();
        self.chunk_start_sample.store(processed, Ordering::SeqCst);
        self.last_segment_end_sample.store(processed, Ordering::SeqCst);
        self.segment_count.fetch_add(1, Ordering::SeqCst);
        self.trim_history();
    }

    /// Discards leading chunks whose last sample is older than
    /// `processed_samples - hard_limit_samples`, rebasing all counters by
    /// the same delta so relative offsets are preserved.
    pub fn trim_history(&mut self) {
        let processed = self.processed_samples();
        let retain_from = min2(
            self.chunk_start_sample(),
            self.last_segment_end_sample(),
        )
        .min(processed.saturating_sub(self.limits.hard_limit_samples));

        if retain_from == 0 {
            return;
        }

        while let Some(front) = self.chunks.front() {
            let front_end = front.start_sample + front.chunk.len();
            if front_end <= retain_from {
                self.chunks.pop_front();
            } else {
                break;
            }
        }

        // Rebase: subtract `retain_from` from every counter and every
        // retained chunk's start_sample, so offset 0 is always "oldest
        // retained sample".
        for entry in &mut self.chunks {
            entry.start_sample = entry.start_sample.saturating_sub(retain_from);
        }
        self.processed_samples
            .fetch_sub(retain_from, Ordering::SeqCst);
        self.chunk_start_sample
            .fetch_sub(retain_from.min(self.chunk_start_sample()), Ordering::SeqCst);
        self.last_segment_end_sample.fetch_sub(
            retain_from.min(self.last_segment_end_sample()),
            Ordering::SeqCst,
        );
    }

    /// Drops everything, resets counters. Called at session end.
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.processed_samples.store(0, Ordering::SeqCst);
        self.chunk_start_sample.store(0, Ordering::SeqCst);
        self.last_segment_end_sample.store(0, Ordering::SeqCst);
        self.segment_count.store(0, Ordering::SeqCst);
    }
}

fn min2(a: usize, b: usize) -> usize {
    if a < b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(n: usize, value: f32) -> AudioChunk {
        AudioChunk::new(vec![value; n])
    }

    #[test]
    fn append_increments_processed_samples() {
        let mut buf = CaptureBuffer::new(CaptureLimits::default());
        buf.append(chunk_of(100, 1.0));
        buf.append(chunk_of(50, 2.0));
        assert_eq!(buf.processed_samples(), 150);
    }

    #[test]
    fn full_since_session_start_is_exact_concatenation() {
        let mut buf = CaptureBuffer::new(CaptureLimits::default());
        buf.append(chunk_of(3, 1.0));
        buf.append(chunk_of(2, 2.0));
        assert_eq!(buf.full_since_session_start(), vec![1.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn tail_since_last_segment_none_when_empty() {
        let mut buf = CaptureBuffer::new(CaptureLimits::default());
        buf.append(chunk_of(10, 1.0));
        buf.advance_chunk();
        assert!(buf.tail_since_last_segment().is_none());
    }

    #[test]
    fn trim_history_preserves_tail_slice() {
        let limits = CaptureLimits {
            soft_limit_samples: 20,
            hard_limit_samples: 20,
        };
        let mut buf = CaptureBuffer::new(limits);
        buf.append(chunk_of(15, 1.0));
        buf.advance_chunk();
        let before = buf.tail_since_last_segment();
        buf.append(chunk_of(15, 2.0));
        buf.trim_history();
        let after_start = buf.last_segment_end_sample();
        let after_end = buf.processed_samples();
        assert_eq!(buf.slice(after_start, after_end), vec![2.0; 15]);
        assert!(before.is_none() || before.unwrap().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut buf = CaptureBuffer::new(CaptureLimits::default());
        buf.append(chunk_of(100, 1.0));
        buf.advance_chunk();
        buf.reset();
        assert_eq!(buf.processed_samples(), 0);
        assert_eq!(buf.segment_count(), 0);
        assert!(buf.full_since_session_start().is_empty());
    }

    #[test]
    fn soft_and_hard_limits() {
        let limits = CaptureLimits {
            soft_limit_samples: 10,
            hard_limit_samples: 20,
        };
        let mut buf = CaptureBuffer::new(limits);
        buf.append(chunk_of(10, 1.0));
        assert!(buf.at_soft_limit());
        assert!(!buf.at_hard_limit());
        buf.append(chunk_of(10, 1.0));
        assert!(buf.at_hard_limit());
    }
}
