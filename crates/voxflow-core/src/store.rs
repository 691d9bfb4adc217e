//! Segment Store (§4.3): the canonical ordered sequence of [`Segment`]s for
//! the active session, plus the `pending_action_queue` FIFO that drains
//! deterministically onto the next `Transcribed` append.
//!
//! Mutated only on the supervisor thread; read-only snapshots are published
//! to subscribers via a callback list, matching the one-directional
//! back-reference design in §9 ("the store publishes read-only snapshots
//! via a subscribe-with-callback interface").

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::action::HandlerEntry;
use crate::segment::{Segment, SegmentId, SegmentIdAllocator};

/// A snapshot listener invoked every time the store's contents change. Per
/// §9, callbacks are invoked on the supervisor thread only — this is a
/// plain `Fn`, not a spawned task.
pub type SnapshotListener = Box<dyn Fn(&[Segment]) + Send + Sync>;

#[derive(Default)]
struct Inner {
    segments: Vec<Segment>,
    pending_action_queue: VecDeque<HandlerEntry>,
    id_alloc: SegmentIdAllocator,
    listeners: Vec<SnapshotListener>,
}

/// Ordered sequence of Segments + a FIFO of pending handler configurations
/// (§3, §4.3). One instance per session.
pub struct SegmentStore {
    inner: Mutex<Inner>,
    completed_notify: Notify,
}

impl Default for SegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            completed_notify: Notify::new(),
        }
    }

    /// Registers a snapshot listener, invoked after every mutation.
    pub fn subscribe(&self, listener: SnapshotListener) {
        self.inner.lock().listeners.push(listener);
    }

    fn notify_listeners(inner: &Inner) {
        for listener in &inner.listeners {
            listener(&inner.segments);
        }
    }

    /// Read-only snapshot of the current segment order.
    pub fn snapshot(&self) -> Vec<Segment> {
        self.inner.lock().segments.clone()
    }

    pub fn segment_count(&self) -> usize {
        self.inner.lock().segments.len()
    }

    pub fn transcribed_count(&self) -> usize {
        self.inner
            .lock()
            .segments
            .iter()
            .filter(|s| s.is_transcribed())
            .count()
    }

    /// At most one `InProgress` segment exists at a time; if one is
    /// already present this appends a new one instead (callers are
    /// expected to use `update_inprogress` once one exists).
    pub fn append_inprogress(&self, text: impl Into<String>, timestamp: i64) -> SegmentId {
        let mut inner = self.inner.lock();
        let id = inner.id_alloc.next();
        inner.segments.push(Segment::InProgress {
            id,
            text: text.into(),
            timestamp,
            confidence: None,
            start: None,
            end: None,
        });
        Self::notify_listeners(&inner);
        id
    }

    /// Replaces the text of an existing `InProgress` segment in place.
    pub fn update_inprogress(&self, id: SegmentId, text: impl Into<String>) {
        let mut inner = self.inner.lock();
        if let Some(seg) = inner.segments.iter_mut().find(|s| s.id() == id) {
            if let Segment::InProgress { text: t, .. } = seg {
                *t = text.into();
            }
        }
        Self::notify_listeners(&inner);
    }

    /// Converts an `InProgress` segment into `Transcribed`, draining the
    /// pending action queue onto it before returning (§4.3: "On each new
    /// Transcribed append: drain the pending_action_queue onto it in
    /// arrival order before external notification").
    pub fn promote(
        &self,
        id: SegmentId,
        final_text: impl Into<String>,
        completed: bool,
        timestamp: i64,
    ) -> Vec<HandlerEntry> {
        let mut inner = self.inner.lock();
        if let Some(seg) = inner.segments.iter_mut().find(|s| s.id() == id) {
            *seg = Segment::Transcribed {
                id,
                text: final_text.into(),
                timestamp,
                completed,
                confidence: None,
                start: None,
                end: None,
            };
        }
        let drained = inner.pending_action_queue.drain(..).collect::<Vec<_>>();
        Self::notify_listeners(&inner);
        if completed && inner.segments.iter().all(|s| match s {
            Segment::Transcribed { completed, .. } => *completed,
            _ => true,
        }) {
            drop(inner);
            self.completed_notify.notify_waiters();
        }
        drained
    }

    /// Appends a brand new `Transcribed` segment directly (used by batch
    /// plugins and the PTT fallback path, which never produce an
    /// `InProgress` segment first). Drains the pending queue the same way
    /// `promote` does.
    pub fn append_transcribed(
        &self,
        text: impl Into<String>,
        completed: bool,
        timestamp: i64,
    ) -> (SegmentId, Vec<HandlerEntry>) {
        let mut inner = self.inner.lock();
        let id = inner.id_alloc.next();
        inner.segments.push(Segment::Transcribed {
            id,
            text: text.into(),
            timestamp,
            completed,
            confidence: None,
            start: None,
            end: None,
        });
        let drained = inner.pending_action_queue.drain(..).collect::<Vec<_>>();
        Self::notify_listeners(&inner);
        if completed {
            drop(inner);
            self.completed_notify.notify_waiters();
        }
        (id, drained)
    }

    pub fn append_selected(
        &self,
        text: impl Into<String>,
        original_text: impl Into<String>,
        has_selection: bool,
        timestamp: i64,
    ) -> SegmentId {
        let mut inner = self.inner.lock();
        let id = inner.id_alloc.next();
        inner.segments.push(Segment::Selected {
            id,
            text: text.into(),
            original_text: original_text.into(),
            has_selection,
            timestamp,
        });
        Self::notify_listeners(&inner);
        id
    }

    /// Deletes the last `n` segments.
    pub fn delete_last(&self, n: u32) {
        let mut inner = self.inner.lock();
        let new_len = inner.segments.len().saturating_sub(n as usize);
        inner.segments.truncate(new_len);
        Self::notify_listeners(&inner);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.segments.clear();
        inner.pending_action_queue.clear();
        Self::notify_listeners(&inner);
    }

    /// Replaces the text of the last segment (any variant) in place.
    pub fn replace_last(&self, text: impl Into<String>) {
        let mut inner = self.inner.lock();
        let new_text = text.into();
        if let Some(seg) = inner.segments.last_mut() {
            set_segment_text(seg, new_text);
        }
        Self::notify_listeners(&inner);
    }

    /// Lower-cases the first character of the last segment's text,
    /// leaving the rest untouched.
    pub fn lowercase_first_char_last(&self) {
        let mut inner = self.inner.lock();
        if let Some(seg) = inner.segments.last_mut() {
            let current = seg.text().to_string();
            let mut chars = current.chars();
            let lowered = match chars.next() {
                Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
                None => current,
            };
            set_segment_text(seg, lowered);
        }
        Self::notify_listeners(&inner);
    }

    /// Appended to `pending_action_queue`, to run against the next
    /// arriving Transcribed segment (§3, §4.7).
    pub fn enqueue_pending_handlers(&self, handlers: Vec<HandlerEntry>) {
        let mut inner = self.inner.lock();
        inner.pending_action_queue.extend(handlers);
        Self::notify_listeners(&inner);
    }

    pub fn pending_queue_len(&self) -> usize {
        self.inner.lock().pending_action_queue.len()
    }

    /// Blocks until every `Transcribed` segment has `completed=true`, or
    /// `timeout` fires first. Default timeout per §5 is 30s; callers pass
    /// it explicitly here rather than hardcoding it in the store.
    pub async fn wait_for_completed(&self, timeout: Duration) -> bool {
        if self.all_transcribed_completed() {
            return true;
        }
        let wait = self.completed_notify.notified();
        tokio::select! {
            _ = wait => self.all_transcribed_completed(),
            _ = tokio::time::sleep(timeout) => self.all_transcribed_completed(),
        }
    }

    fn all_transcribed_completed(&self) -> bool {
        let inner = self.inner.lock();
        inner.segments.iter().all(|s| match s {
            Segment::Transcribed { completed, .. } => *completed,
            _ => true,
        })
    }

    /// Raw concatenation rule (§8 S4): join every `Transcribed` segment's
    /// text with a single space, in store order.
    pub fn concatenated_transcribed_text(&self) -> String {
        self.inner
            .lock()
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Transcribed { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn set_segment_text(seg: &mut Segment, new_text: String) {
    match seg {
        Segment::InProgress { text, .. } => *text = new_text,
        Segment::Transcribed { text, .. } => *text = new_text,
        Segment::Selected { text, .. } => *text = new_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Handler, HandlerEntry, SegmentOp};

    #[test]
    fn pending_queue_drains_onto_next_transcribed_append() {
        let store = SegmentStore::new();
        store.enqueue_pending_handlers(vec![HandlerEntry {
            handler: Handler::SegmentOp {
                op: SegmentOp::LowercaseFirstChar,
            },
            apply_to_next_segment: true,
            stop_on_success: false,
        }]);
        assert_eq!(store.pending_queue_len(), 1);

        let (_, drained) = store.append_transcribed("About the weather", true, 0);
        assert_eq!(drained.len(), 1);
        assert_eq!(store.pending_queue_len(), 0);
    }

    #[test]
    fn raw_concatenation_joins_with_single_space() {
        let store = SegmentStore::new();
        store.append_transcribed("I was thinking", true, 0);
        store.append_transcribed("about the weather", true, 1);
        assert_eq!(
            store.concatenated_transcribed_text(),
            "I was thinking about the weather"
        );
    }

    #[tokio::test]
    async fn wait_for_completed_returns_immediately_when_already_done() {
        let store = SegmentStore::new();
        store.append_transcribed("done", true, 0);
        let ok = store
            .wait_for_completed(std::time::Duration::from_millis(50))
            .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn wait_for_completed_resolves_on_notify() {
        let store = std::sync::Arc::new(SegmentStore::new());
        let id = {
            let mut inner = store.inner.lock();
            let id = inner.id_alloc.next();
            inner.segments.push(Segment::Transcribed {
                id,
                text: "partial".into(),
                timestamp: 0,
                completed: false,
                confidence: None,
                start: None,
                end: None,
            });
            id
        };
        let store2 = store.clone();
        let handle = tokio::spawn(async move {
            store2
                .wait_for_completed(std::time::Duration::from_secs(5))
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store.promote(id, "final", true, 1);
        let ok = handle.await.unwrap();
        assert!(ok);
    }

    #[test]
    fn lowercase_first_char_only_touches_first_character() {
        let store = SegmentStore::new();
        store.append_transcribed("About the Weather", true, 0);
        store.lowercase_first_char_last();
        assert_eq!(store.concatenated_transcribed_text(), "about the Weather");
    }
}
