//! No-operation STT plugin for testing and fallback

use async_trait::async_trait;

use crate::plugin::{PluginCapabilities, PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, UiCallbacks};
use crate::types::TranscriptionEvent;

/// A no-op STT plugin that never transcribes anything.
/// Useful for testing the pipeline without STT dependencies.
#[derive(Debug, Clone, Default)]
pub struct NoOpPlugin {
    activated: bool,
}

impl NoOpPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SttPlugin for NoOpPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: "noop".to_string(),
            name: "No-Op STT".to_string(),
            description: "A null STT plugin that produces no transcriptions".to_string(),
        }
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            supports_realtime: true,
            supports_batch: true,
            requires_api_key: false,
            requires_model_download: false,
            overrides_ai_transformation: false,
        }
    }

    async fn initialize(&mut self) -> Result<(), SttPluginError> {
        Ok(())
    }

    async fn on_activated(&mut self, _ui: &UiCallbacks) -> Result<(), SttPluginError> {
        self.activated = true;
        Ok(())
    }

    async fn on_deactivated(&mut self) -> Result<(), SttPluginError> {
        self.activated = false;
        Ok(())
    }

    async fn start_stream(&mut self, _ui: &UiCallbacks) -> Result<(), SttPluginError> {
        Ok(())
    }

    async fn process_audio_segment(
        &mut self,
        _samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttPluginError> {
        Ok(None)
    }

    async fn transcribe_file(&mut self, _path: &std::path::Path) -> Result<String, SttPluginError> {
        Ok(String::new())
    }
}

/// Factory for creating NoOpPlugin instances
pub struct NoOpPluginFactory;

impl SttPluginFactory for NoOpPluginFactory {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        Ok(Box::new(NoOpPlugin::new()))
    }

    fn plugin_info(&self) -> PluginInfo {
        NoOpPlugin::new().info()
    }

    fn check_requirements(&self) -> Result<(), SttPluginError> {
        Ok(())
    }
}
