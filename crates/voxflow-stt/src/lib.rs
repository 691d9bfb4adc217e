//! Speech-to-text abstraction layer for VoxFlow
//!
//! This crate provides the transcription plugin contract: the shape every
//! recognizer backend (local batch, local streaming, cloud) must implement
//! so the Flow Supervisor can drive them all the same way.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod common;
pub mod constants;
pub mod plugin;
pub mod plugins;
pub mod types;
pub mod validation;

pub use plugin::{
    OptionCategory, OptionConstraints, OptionSpec, OptionType, OptionValue, PluginCapabilities,
    PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, SttPluginRegistry, UiCallbacks,
};
pub use types::{
    PluginStatus, PluginUpdateEvent, TranscriptionConfig, TranscriptionEvent, UpdateSegment,
    UpdateSegmentKind, WordInfo,
};
pub use voxflow_foundation::error::VoxFlowError;

/// Generates unique utterance IDs
static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Low-level streaming interface a concrete recognizer engine implements
/// (e.g. a `vosk::Recognizer` wrapper). A [`plugin::SttPlugin`] adapts one
/// of these into the plugin contract; this trait is the seam between
/// "an engine that turns PCM into text" and "a pluggable backend".
pub trait Transcriber {
    /// Feed 16 kHz, mono, S16LE PCM samples.
    /// Returns Some(final_text_or_json) when an utterance completes, else none.
    fn accept_pcm16(&mut self, pcm: &[i16]) -> Result<Option<String>, String>;

    /// Signal end of input for the current utterance and get final result if any.
    fn finalize(&mut self) -> Result<Option<String>, String>;
}

/// Event-based variant of [`Transcriber`], used by engines that can report
/// partial and final results with word-level timing.
pub trait EventBasedTranscriber: Send + Sync {
    fn accept_frame(&mut self, pcm: &[i16]) -> Result<Option<TranscriptionEvent>, String>;
    fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, String>;
    fn reset(&mut self) -> Result<(), String>;
    fn config(&self) -> &TranscriptionConfig;
}
