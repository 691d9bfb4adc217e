//! Whisper.cpp - Lightweight C++ implementation of OpenAI Whisper
//!
//! This plugin wraps whisper.cpp, a lightweight C++ port of OpenAI's Whisper
//! that uses ggml quantization for efficient inference on CPU. It is a
//! batch plugin: it transcribes a complete file rather than streaming.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::plugin::{
    ModelProgress, OptionCategory, OptionConstraints, OptionSpec, OptionType, OptionValue,
    PluginCapabilities, PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, UiCallbacks,
};

/// Whisper model types (ggml quantized)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperModelType {
    /// Tiny model - 39MB, fastest, lower accuracy
    Tiny,
    /// Tiny English-only - 39MB, optimized for English
    TinyEn,
    /// Base model - 74MB, balanced
    Base,
    /// Small model - 244MB, good accuracy
    Small,
}

impl WhisperModelType {
    pub fn model_size_mb(&self) -> u32 {
        match self {
            Self::Tiny | Self::TinyEn => 39,
            Self::Base => 74,
            Self::Small => 244,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Tiny => "ggml-tiny.bin",
            Self::TinyEn => "ggml-tiny.en.bin",
            Self::Base => "ggml-base.bin",
            Self::Small => "ggml-small.bin",
        }
    }

    fn from_key(key: &str) -> Self {
        match key {
            "tiny.en" => Self::TinyEn,
            "base" => Self::Base,
            "small" => Self::Small,
            _ => Self::Tiny,
        }
    }
}

/// Whisper.cpp configuration
#[derive(Debug, Clone)]
pub struct WhisperCppConfig {
    pub model_type: WhisperModelType,
    pub model_dir: PathBuf,
    pub language: String,
    pub num_threads: u32,
}

impl Default for WhisperCppConfig {
    fn default() -> Self {
        Self {
            model_type: WhisperModelType::TinyEn,
            model_dir: PathBuf::from("models/whisper-cpp"),
            language: "en".to_string(),
            num_threads: 4,
        }
    }
}

/// Whisper.cpp STT Plugin.
///
/// This is a stub integration: the FFI bindings for whisper.cpp itself are
/// out of this contract's scope (§1 concrete transcriber implementations
/// are an external collaborator). What's implemented here is the plugin
/// lifecycle, model management, and schema wiring a real binding would sit
/// behind.
#[derive(Debug)]
pub struct WhisperCppPlugin {
    config: WhisperCppConfig,
    model_ready: RwLock<bool>,
}

impl WhisperCppPlugin {
    pub fn new() -> Self {
        Self::with_config(WhisperCppConfig::default())
    }

    pub fn with_config(config: WhisperCppConfig) -> Self {
        Self {
            config,
            model_ready: RwLock::new(false),
        }
    }

    fn model_path(&self) -> PathBuf {
        self.config.model_dir.join(self.config.model_type.filename())
    }
}

impl Default for WhisperCppPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SttPlugin for WhisperCppPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: "whisper-cpp".to_string(),
            name: "Whisper.cpp".to_string(),
            description: "Lightweight C++ implementation of OpenAI Whisper with quantized models"
                .to_string(),
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
        if !self.model_path().exists() {
            ui.log(format!(
                "whisper-cpp: model {} not present, call ensure_model before transcribing",
                self.config.model_type.filename()
            ));
            return Err(SttPluginError::ModelMissing {
                reason: format!("model not found at {}", self.model_path().display()),
            });
        }
        *self.model_ready.write() = true;
        Ok(())
    }

    async fn on_deactivated(&mut self) -> Result<(), SttPluginError> {
        *self.model_ready.write() = false;
        Ok(())
    }

    async fn transcribe_file(&mut self, path: &Path) -> Result<String, SttPluginError> {
        if !*self.model_ready.read() {
            return Err(SttPluginError::Unavailable {
                reason: "model not loaded; on_activated must succeed first".into(),
            });
        }
        if !path.exists() {
            return Err(SttPluginError::TranscriptionFailed(format!(
                "input file not found: {}",
                path.display()
            )));
        }
        info!(file = %path.display(), "whisper-cpp: transcribe_file (stub)");
        Err(SttPluginError::Unavailable {
            reason: "whisper.cpp FFI binding not linked in this build".into(),
        })
    }

    fn schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec {
            key: "model".to_string(),
            option_type: OptionType::ModelSelect {
                choices: vec![
                    "tiny".to_string(),
                    "tiny.en".to_string(),
                    "base".to_string(),
                    "small".to_string(),
                ],
            },
            default: OptionValue::String("tiny.en".to_string()),
            category: OptionCategory::Model,
            constraints: OptionConstraints::default(),
        }]
    }

    async fn update_options(
        &mut self,
        values: HashMap<String, OptionValue>,
        _ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        if let Some(OptionValue::String(model)) = values.get("model") {
            self.config.model_type = WhisperModelType::from_key(model);
            *self.model_ready.write() = false;
        }
        Ok(())
    }

    async fn ensure_model(
        &mut self,
        values: &HashMap<String, OptionValue>,
        ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        if let Some(OptionValue::String(model)) = values.get("model") {
            self.config.model_type = WhisperModelType::from_key(model);
        }
        let path = self.model_path();
        if path.exists() {
            return Ok(());
        }
        let total = (self.config.model_type.model_size_mb() as u64) * 1024 * 1024;
        ui.progress(ModelProgress {
            downloaded_bytes: 0,
            total_bytes: Some(total),
            message: format!("downloading {}", self.config.model_type.filename()),
        });
        Err(SttPluginError::ModelMissing {
            reason: "model download is an external collaborator concern in this build".into(),
        })
    }
}

/// Factory for creating Whisper.cpp plugin instances
pub struct WhisperCppPluginFactory {
    config: WhisperCppConfig,
}

impl WhisperCppPluginFactory {
    pub fn new() -> Self {
        Self {
            config: WhisperCppConfig::default(),
        }
    }

    pub fn with_model(model_type: WhisperModelType) -> Self {
        Self {
            config: WhisperCppConfig {
                model_type,
                ..Default::default()
            },
        }
    }
}

impl Default for WhisperCppPluginFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SttPluginFactory for WhisperCppPluginFactory {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        Ok(Box::new(WhisperCppPlugin::with_config(self.config.clone())))
    }

    fn plugin_info(&self) -> PluginInfo {
        WhisperCppPlugin::new().info()
    }

    fn check_requirements(&self) -> Result<(), SttPluginError> {
        Err(SttPluginError::Unavailable {
            reason: "whisper.cpp FFI binding not linked in this build".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn activation_fails_without_model_on_disk() {
        let mut plugin = WhisperCppPlugin::with_config(WhisperCppConfig {
            model_dir: PathBuf::from("/nonexistent/voxflow-test-models"),
            ..Default::default()
        });
        let err = plugin.on_activated(&UiCallbacks::none()).await.unwrap_err();
        assert!(matches!(err, SttPluginError::ModelMissing { .. }));
    }
}
