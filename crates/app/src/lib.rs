//! Glue crate: wires the capture/VAD/STT/injection crates to the Flow
//! Supervisor's contracts (§4.7, §9) and drives the result from hotkey
//! dispatch. Nothing in here implements dictation logic itself — that all
//! lives in `voxflow-core`, `voxflow-audio`, `voxflow-vad`, and the
//! concrete STT/injection crates.

pub mod adapters;
pub mod hotkey;
pub mod runtime;

#[cfg(feature = "text-injection")]
pub use voxflow_text_injection as text_injection;

pub use voxflow_stt as stt;
pub use voxflow_core::config::DictationConfig as Settings;
