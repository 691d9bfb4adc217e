//! The capture-side contract the Flow Supervisor programs against (§4.7,
//! §9 "Async lifecycle -> explicit state machine"). The concrete adapter —
//! wiring a real mic thread, [`voxflow_audio::CaptureBuffer`] and the VAD
//! segmenter together — lives with the application glue; this trait only
//! fixes the shape the supervisor needs: start, and a stop call whose
//! return value is the *sole* source of PTT fallback audio.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureControlError {
    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("capture already active")]
    AlreadyActive,
}

/// Race-free PTT fallback contract (§4.7): `stop` resolves synchronously
/// with respect to the supervisor's control flow (i.e. is awaited inline
/// in the `Finishing` transition, never delivered via a side-channel
/// event). Returns `Some(samples)` only when the session's VAD-derived
/// segment count was zero at stop time; returns `None` on every
/// subsequent call for the same session (fallback delivered at most once,
/// §8 round-trip law).
#[async_trait]
pub trait CaptureControl: Send + Sync {
    async fn start(&self) -> Result<(), CaptureControlError>;
    async fn stop(&self) -> Option<Vec<f32>>;
}
