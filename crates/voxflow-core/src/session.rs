//! Session lifecycle (§3). A `Session` is created when dictation starts and
//! destroyed on `Complete` or `Cancel`; the Flow Supervisor exclusively owns
//! it and the current capture buffer (§3 Ownership).

use serde::{Deserialize, Serialize};

/// How the active session was triggered (§6 hotkey surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictationMode {
    /// First trigger starts, second trigger finishes.
    Toggle,
    /// Key-down starts, key-up finishes (with the fallback protocol, §4.7).
    PushToTalk,
}

/// Externally observable dictation lifecycle state (§3). One-way
/// progression except `Recording -> Finishing -> {Transcribing, Complete}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Idle,
    Starting,
    Recording,
    Finishing,
    Transcribing,
    Transforming,
    Injecting,
    Complete,
    Error,
}

impl FlowStatus {
    /// The dictation window must stay visible throughout these states
    /// (§4.7 "Window/UI liveness contract").
    pub fn requires_window_visible(self) -> bool {
        matches!(
            self,
            FlowStatus::Finishing
                | FlowStatus::Transcribing
                | FlowStatus::Transforming
                | FlowStatus::Injecting
        )
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub mode: DictationMode,
    pub started_at: i64,
    pub had_selection: bool,
    pub selected_text: Option<String>,
    pub context: Option<String>,
}

impl Session {
    pub fn new(mode: DictationMode, started_at: i64) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            mode,
            started_at,
            had_selection: false,
            selected_text: None,
            context: None,
        }
    }

    pub fn with_selection(mut self, text: Option<String>) -> Self {
        self.had_selection = text.is_some();
        self.selected_text = text;
        self
    }
}
