//! Bridges the always-on microphone/VAD pipeline to
//! [`voxflow_core::capture_control::CaptureControl`].
//!
//! The capture thread and chunker run for the lifetime of the process (see
//! `runtime::start`); what `start`/`stop` here control is only whether the
//! session's [`CaptureBuffer`] is retaining audio and whether VAD-finalized
//! segments get forwarded to the Flow Supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use voxflow_audio::capture_buffer::{AudioChunk, CaptureBuffer, CaptureLimits};
use voxflow_audio::SharedAudioFrame;
use voxflow_core::capture_control::{CaptureControl, CaptureControlError};
use voxflow_core::FlowSupervisor;
use voxflow_vad::types::VadEvent;
use voxflow_vad::VadEngine;

pub struct MicCaptureControl {
    buffer: Mutex<CaptureBuffer>,
    engine: Mutex<Box<dyn VadEngine>>,
    active: AtomicBool,
}

impl MicCaptureControl {
    pub fn new(limits: CaptureLimits, engine: Box<dyn VadEngine>) -> Self {
        Self {
            buffer: Mutex::new(CaptureBuffer::new(limits)),
            engine: Mutex::new(engine),
            active: AtomicBool::new(false),
        }
    }

    /// Feeds one chunker frame through the VAD engine and, while a session
    /// is active, into the capture buffer. Returns the finalized segment
    /// (as i16 PCM) when the engine reports `SpeechEnd`.
    fn process_frame(&self, samples: &[i16]) -> Option<Vec<i16>> {
        let active = self.active.load(Ordering::Acquire);
        if active {
            let floats: Vec<f32> = samples.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
            self.buffer.lock().append(AudioChunk::new(floats));
        }

        let event = match self.engine.lock().process(samples) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("vad engine error: {e}");
                None
            }
        };

        if !active || !matches!(event, Some(VadEvent::SpeechEnd { .. })) {
            return None;
        }

        let mut buf = self.buffer.lock();
        let tail = buf.tail_since_last_segment();
        buf.advance_chunk();
        tail.map(|f| f32_to_i16(&f)).filter(|pcm| !pcm.is_empty())
    }
}

#[async_trait]
impl CaptureControl for MicCaptureControl {
    async fn start(&self) -> Result<(), CaptureControlError> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(CaptureControlError::AlreadyActive);
        }
        self.buffer.lock().reset();
        self.engine.lock().reset();
        Ok(())
    }

    async fn stop(&self) -> Option<Vec<f32>> {
        self.active.store(false, Ordering::Release);
        let mut buf = self.buffer.lock();
        let fallback = if buf.segment_count() == 0 {
            let all = buf.full_since_session_start();
            if all.is_empty() {
                None
            } else {
                Some(all)
            }
        } else {
            None
        };
        buf.reset();
        fallback
    }
}

fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}


/// Runs for the process lifetime, draining the chunker's audio broadcast
/// through `capture` and calling [`FlowSupervisor::on_vad_segment`] for
/// every finalized segment. Frames that arrive between sessions are still
/// run through the VAD engine (so its hysteresis state stays current) but
/// produce no segments since `capture` isn't retaining audio.
pub fn spawn_segmenter(
    mut audio_rx: broadcast::Receiver<SharedAudioFrame>,
    capture: Arc<MicCaptureControl>,
    supervisor: Arc<FlowSupervisor>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match audio_rx.recv().await {
                Ok(frame) => {
                    if let Some(segment) = capture.process_frame(&frame.samples) {
                        supervisor.on_vad_segment(&segment).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("segmenter lagged, dropped {skipped} audio frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
