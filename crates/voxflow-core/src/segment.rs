//! Segment data model (§3). A `Segment` is a tagged record describing one
//! span of recognized (or selected) text; the [`crate::store::SegmentStore`]
//! owns the canonical ordered sequence of them for a session.

use serde::{Deserialize, Serialize};

/// Unique per-session segment identity. Insertion order is preserved
/// wherever segments are displayed or injected; `SegmentId` itself carries
/// no ordering guarantee beyond uniqueness — the store's `Vec` order is
/// authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seg-{}", self.0)
    }
}

/// Monotonic per-session segment id allocator.
#[derive(Debug, Default)]
pub struct SegmentIdAllocator(u64);

impl SegmentIdAllocator {
    pub fn next(&mut self) -> SegmentId {
        self.0 += 1;
        SegmentId(self.0)
    }
}

/// A contiguous span of audio or its transcribed text (§3, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Partial, displayable, never injected.
    InProgress {
        id: SegmentId,
        text: String,
        timestamp: i64,
        confidence: Option<f32>,
        start: Option<f64>,
        end: Option<f64>,
    },
    /// Final only when `completed`.
    Transcribed {
        id: SegmentId,
        text: String,
        timestamp: i64,
        completed: bool,
        confidence: Option<f32>,
        start: Option<f64>,
        end: Option<f64>,
    },
    /// Text the user had selected before dictation started. Context only —
    /// never injected.
    Selected {
        id: SegmentId,
        text: String,
        original_text: String,
        has_selection: bool,
        timestamp: i64,
    },
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        match self {
            Segment::InProgress { id, .. } => *id,
            Segment::Transcribed { id, .. } => *id,
            Segment::Selected { id, .. } => *id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Segment::InProgress { text, .. } => text,
            Segment::Transcribed { text, .. } => text,
            Segment::Selected { text, .. } => text,
        }
    }

    pub fn is_transcribed(&self) -> bool {
        matches!(self, Segment::Transcribed { .. })
    }

    pub fn is_completed_transcribed(&self) -> bool {
        matches!(self, Segment::Transcribed { completed: true, .. })
    }
}
