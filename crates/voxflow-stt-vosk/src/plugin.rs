use crate::model;
use crate::vosk_transcriber::VoskTranscriber;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use voxflow_stt::plugin::{
    OptionCategory, OptionConstraints, OptionSpec, OptionType, OptionValue, PluginCapabilities,
    PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, UiCallbacks,
};
use voxflow_stt::{EventBasedTranscriber, TranscriptionConfig, TranscriptionEvent};

/// Vosk-backed [`SttPlugin`]. Wraps a [`VoskTranscriber`] — the low-level
/// `EventBasedTranscriber` engine seam — and exposes it through the plugin
/// contract. The transcriber is only constructed in `on_activated`, so
/// installing this plugin costs nothing until it's actually selected.
pub struct VoskPlugin {
    transcriber: Option<VoskTranscriber>,
    config: TranscriptionConfig,
    sample_rate: f32,
    model_path: PathBuf,
}

impl fmt::Debug for VoskPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoskPlugin")
            .field(
                "transcriber",
                &self.transcriber.as_ref().map(|_| "Some(VoskTranscriber)"),
            )
            .field("config", &self.config)
            .field("sample_rate", &self.sample_rate)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl Default for VoskPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl VoskPlugin {
    pub fn new() -> Self {
        let model_info = model::locate_model(None).ok();
        let model_path = model_info.map_or_else(model::default_model_path, |info| info.path);

        Self {
            transcriber: None,
            config: TranscriptionConfig::default(),
            sample_rate: 16000.0,
            model_path,
        }
    }

    fn require_transcriber(&mut self) -> Result<&mut VoskTranscriber, SttPluginError> {
        self.transcriber.as_mut().ok_or_else(|| SttPluginError::Unavailable {
            reason: "plugin not activated".to_string(),
        })
    }
}

#[async_trait]
impl SttPlugin for VoskPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: "vosk".to_string(),
            name: "Vosk".to_string(),
            description: "Offline Vosk speech recognition".to_string(),
        }
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            supports_realtime: true,
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
                "vosk: model not found at {}",
                self.model_path.display()
            ));
            return Err(SttPluginError::ModelMissing {
                reason: format!("model not found at {}", self.model_path.display()),
            });
        }
        let mut config = self.config.clone();
        config.model_path = self.model_path.to_string_lossy().into_owned();
        let transcriber = VoskTranscriber::new(config, self.sample_rate)
            .map_err(|e| SttPluginError::Unavailable { reason: e })?;
        self.transcriber = Some(transcriber);
        Ok(())
    }

    async fn on_deactivated(&mut self) -> Result<(), SttPluginError> {
        self.transcriber = None;
        Ok(())
    }

    async fn start_stream(&mut self, _ui: &UiCallbacks) -> Result<(), SttPluginError> {
        self.require_transcriber()?;
        Ok(())
    }

    async fn process_audio_segment(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttPluginError> {
        self.require_transcriber()?
            .accept_frame(samples)
            .map_err(SttPluginError::TranscriptionFailed)
    }

    async fn stop_stream(&mut self) -> Result<(), SttPluginError> {
        if let Some(transcriber) = self.transcriber.as_mut() {
            transcriber
                .finalize_utterance()
                .map_err(SttPluginError::TranscriptionFailed)?;
        }
        Ok(())
    }

    async fn transcribe_file(&mut self, path: &Path) -> Result<String, SttPluginError> {
        let _ = path;
        Err(SttPluginError::Unavailable {
            reason: "vosk plugin only supports realtime streaming in this build".into(),
        })
    }

    fn schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec {
            key: "include_words".to_string(),
            option_type: OptionType::Bool,
            default: OptionValue::Bool(false),
            category: OptionCategory::Advanced,
            constraints: OptionConstraints::default(),
        }]
    }

    async fn update_options(
        &mut self,
        values: std::collections::HashMap<String, OptionValue>,
        _ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        if let Some(OptionValue::Bool(include_words)) = values.get("include_words") {
            self.config.include_words = *include_words;
            if let Some(transcriber) = self.transcriber.as_mut() {
                transcriber
                    .update_config(self.config.clone(), self.sample_rate)
                    .map_err(|e| SttPluginError::Unavailable { reason: e })?;
            }
        }
        Ok(())
    }

    async fn ensure_model(
        &mut self,
        _values: &std::collections::HashMap<String, OptionValue>,
        ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        if self.model_path.exists() {
            return Ok(());
        }
        ui.log("vosk: model download is an external collaborator concern in this build");
        Err(SttPluginError::ModelMissing {
            reason: format!("model not found at {}", self.model_path.display()),
        })
    }
}

pub struct VoskPluginFactory;

impl VoskPluginFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VoskPluginFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SttPluginFactory for VoskPluginFactory {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        Ok(Box::new(VoskPlugin::new()))
    }

    fn plugin_info(&self) -> PluginInfo {
        VoskPlugin::new().info()
    }

    fn check_requirements(&self) -> Result<(), SttPluginError> {
        match model::locate_model(None) {
            Ok(_) => Ok(()),
            Err(e) => Err(SttPluginError::ModelMissing {
                reason: format!("vosk model not found: {}", e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn activation_fails_without_model_on_disk() {
        let mut plugin = VoskPlugin {
            transcriber: None,
            config: TranscriptionConfig::default(),
            sample_rate: 16000.0,
            model_path: PathBuf::from("/nonexistent/voxflow-test-vosk-model"),
        };
        let err = plugin.on_activated(&UiCallbacks::none()).await.unwrap_err();
        assert!(matches!(err, SttPluginError::ModelMissing { .. }));
    }

    #[tokio::test]
    async fn streaming_before_activation_reports_unavailable() {
        let mut plugin = VoskPlugin::new();
        let err = plugin
            .process_audio_segment(&[0i16; 160])
            .await
            .unwrap_err();
        assert!(matches!(err, SttPluginError::Unavailable { .. }));
    }
}
