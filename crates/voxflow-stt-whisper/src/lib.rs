//! whisper.cpp-backed [`SttPlugin`]. Unlike Vosk this backend has no
//! incremental decode API: every call to `process_audio_segment` runs a
//! full `whisper_full` pass over the samples it's given. That's a good fit
//! for how the Flow Supervisor drives plugins — one call per
//! VAD-finalized segment — so this plugin is modeled as batch-only rather
//! than pretending to stream.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use voxflow_stt::plugin::{
    PluginCapabilities, PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, UiCallbacks,
};
use voxflow_stt::types::TranscriptionEvent;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const DEFAULT_MODEL_PATH: &str = "models/whisper/ggml-tiny.en.bin";

#[derive(Debug, Error)]
pub enum WhisperError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

pub struct WhisperPlugin {
    ctx: Option<Arc<WhisperContext>>,
    model_path: PathBuf,
    language: String,
    n_threads: i32,
    next_utterance: Mutex<u64>,
}

impl std::fmt::Debug for WhisperPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperPlugin")
            .field("model_path", &self.model_path)
            .field("language", &self.language)
            .field("loaded", &self.ctx.is_some())
            .finish()
    }
}

impl Default for WhisperPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WhisperPlugin {
    pub fn new() -> Self {
        Self {
            ctx: None,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            language: "en".to_string(),
            n_threads: 4,
            next_utterance: Mutex::new(0),
        }
    }

    fn require_ctx(&self) -> Result<&Arc<WhisperContext>, SttPluginError> {
        self.ctx.as_ref().ok_or_else(|| SttPluginError::Unavailable {
            reason: "plugin not activated".to_string(),
        })
    }

    fn decode(&self, ctx: &WhisperContext, samples: &[i16]) -> Result<String, WhisperError> {
        let mut float_samples = vec![0.0f32; samples.len()];
        whisper_rs::convert_integer_to_float_audio(samples, &mut float_samples)
            .map_err(|e| WhisperError::Decode(e.to_string()))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| WhisperError::Decode(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.n_threads);
        params.set_language(Some(&self.language));
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);

        state
            .full(params, &float_samples)
            .map_err(|e| WhisperError::Decode(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| WhisperError::Decode(e.to_string()))?;
        let mut text = String::new();
        for i in 0..num_segments {
            if let Ok(segment) = state.full_get_segment_text(i) {
                text.push_str(&segment);
            }
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl SttPlugin for WhisperPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: "whisper-cpp".to_string(),
            name: "Whisper".to_string(),
            description: "Offline whisper.cpp speech recognition".to_string(),
        }
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            supports_realtime: false,
            supports_batch: true,
            requires_api_key: false,
            requires_model_download: true,
            overrides_ai_transformation: false,
        }
    }

    async fn initialize(&mut self) -> Result<(), SttPluginError> {
        Ok(())
    }

    async fn on_activated(&mut self, ui: &UiCallbacks) -> Result<(), SttPluginError> {
        if !self.model_path.exists() {
            ui.log(format!(
                "whisper: model not found at {}",
                self.model_path.display()
            ));
            return Err(SttPluginError::ModelMissing {
                reason: format!("model not found at {}", self.model_path.display()),
            });
        }
        let path = self.model_path.to_string_lossy().into_owned();
        let ctx = WhisperContext::new_with_params(&path, WhisperContextParameters::default())
            .map_err(|e| SttPluginError::Unavailable {
                reason: WhisperError::ModelLoad(e.to_string()).to_string(),
            })?;
        self.ctx = Some(Arc::new(ctx));
        Ok(())
    }

    async fn on_deactivated(&mut self) -> Result<(), SttPluginError> {
        self.ctx = None;
        Ok(())
    }

    /// Treats each call as one complete VAD-finalized utterance: runs a
    /// full whisper decode over `samples` and returns its `Final` text
    /// immediately. There is no partial/incremental output.
    async fn process_audio_segment(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttPluginError> {
        if samples.is_empty() {
            return Ok(None);
        }
        let ctx = self.require_ctx()?.clone();
        let text = self
            .decode(&ctx, samples)
            .map_err(|e| SttPluginError::TranscriptionFailed(e.to_string()))?;
        if text.is_empty() {
            return Ok(None);
        }
        let utterance_id = {
            let mut next = self.next_utterance.lock();
            let id = *next;
            *next += 1;
            id
        };
        Ok(Some(TranscriptionEvent::Final {
            utterance_id,
            text,
            words: None,
        }))
    }

    async fn transcribe_file(&mut self, path: &Path) -> Result<String, SttPluginError> {
        let reader = hound_read(path)
            .map_err(|e| SttPluginError::TranscriptionFailed(e.to_string()))?;
        let ctx = self.require_ctx()?.clone();
        self.decode(&ctx, &reader)
            .map_err(|e| SttPluginError::TranscriptionFailed(e.to_string()))
    }
}

/// Reads a 16-bit mono WAV file into raw PCM samples. `transcribe_file` is
/// the only entry point that touches the filesystem directly; everything
/// else works on in-memory sample slices handed down from the capture
/// layer.
fn hound_read(path: &Path) -> Result<Vec<i16>, String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| e.to_string())
}

pub struct WhisperPluginFactory;

impl Default for WhisperPluginFactory {
    fn default() -> Self {
        Self
    }
}

impl SttPluginFactory for WhisperPluginFactory {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        Ok(Box::new(WhisperPlugin::new()))
    }

    fn plugin_info(&self) -> PluginInfo {
        WhisperPlugin::new().info()
    }

    fn check_requirements(&self) -> Result<(), SttPluginError> {
        if !PathBuf::from(DEFAULT_MODEL_PATH).exists() {
            return Err(SttPluginError::ModelMissing {
                reason: format!("model not found at {DEFAULT_MODEL_PATH}"),
            });
        }
        Ok(())
    }
}
