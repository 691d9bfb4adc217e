//! Mock STT plugin for testing the pipeline without a real recognizer.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::plugin::{
    PluginCapabilities, PluginInfo, SttPlugin, SttPluginError, SttPluginFactory, UiCallbacks,
};
use crate::types::{TranscriptionEvent, WordInfo};

/// Configuration for mock transcriptions
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Text to return after N audio chunks
    pub transcription_after_chunks: Option<(usize, String)>,

    /// Immediate transcription to return
    pub immediate_transcription: Option<String>,

    /// Simulate processing delay in ms
    pub processing_delay_ms: u64,

    /// Simulate failure after N calls
    pub fail_after_calls: Option<usize>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            transcription_after_chunks: Some((1, "mock test transcription".to_string())),
            immediate_transcription: None,
            processing_delay_ms: 0,
            fail_after_calls: None,
        }
    }
}

/// Mock STT plugin for testing the pipeline
#[derive(Debug)]
pub struct MockPlugin {
    config: MockConfig,
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    chunks_processed: usize,
    calls_made: usize,
}

impl MockPlugin {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MockState {
                chunks_processed: 0,
                calls_made: 0,
            })),
        }
    }

    pub fn with_transcription(text: String) -> Self {
        Self::new(MockConfig {
            immediate_transcription: Some(text),
            ..Default::default()
        })
    }

    pub fn with_delayed_transcription(chunks: usize, text: String) -> Self {
        Self::new(MockConfig {
            transcription_after_chunks: Some((chunks, text)),
            immediate_transcription: None,
            ..Default::default()
        })
    }
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl SttPlugin for MockPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: "mock".to_string(),
            name: "Mock STT".to_string(),
            description: "Configurable mock STT for testing".to_string(),
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
        Ok(())
    }

    async fn on_deactivated(&mut self) -> Result<(), SttPluginError> {
        Ok(())
    }

    async fn start_stream(&mut self, _ui: &UiCallbacks) -> Result<(), SttPluginError> {
        Ok(())
    }

    async fn process_audio_segment(
        &mut self,
        _samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttPluginError> {
        let should_fail = {
            let mut state = self.state.lock().unwrap();
            state.calls_made += 1;
            self.config
                .fail_after_calls
                .map(|fail_after| state.calls_made > fail_after)
                .unwrap_or(false)
        };

        if should_fail {
            return Err(SttPluginError::TranscriptionFailed(
                "simulated failure".to_string(),
            ));
        }

        if self.config.processing_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(
                self.config.processing_delay_ms,
            ))
            .await;
        }

        if let Some(ref text) = self.config.immediate_transcription {
            return Ok(Some(create_mock_event(text.clone())));
        }

        let should_transcribe = {
            let mut state = self.state.lock().unwrap();
            state.chunks_processed += 1;
            if let Some((chunks, _)) = self.config.transcription_after_chunks {
                if state.chunks_processed >= chunks {
                    info!(
                        "MockPlugin: producing transcription after {} chunks",
                        state.chunks_processed
                    );
                    state.chunks_processed = 0;
                    true
                } else {
                    false
                }
            } else {
                false
            }
        };

        if should_transcribe {
            if let Some((_, ref text)) = self.config.transcription_after_chunks {
                return Ok(Some(create_mock_event(text.clone())));
            }
        }

        Ok(None)
    }

    async fn transcribe_file(&mut self, _path: &Path) -> Result<String, SttPluginError> {
        Ok(self
            .config
            .immediate_transcription
            .clone()
            .unwrap_or_else(|| "mock test transcription".to_string()))
    }
}

fn create_mock_event(text: String) -> TranscriptionEvent {
    let words: Vec<WordInfo> = text
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| WordInfo {
            text: word.to_string(),
            start: i as f32 * 0.5,
            end: (i as f32 + 1.0) * 0.5,
            conf: 0.95,
        })
        .collect();

    TranscriptionEvent::Final {
        utterance_id: crate::next_utterance_id(),
        text,
        words: Some(words),
    }
}

/// Factory for creating MockPlugin instances
pub struct MockPluginFactory {
    config: MockConfig,
}

impl MockPluginFactory {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }
}

impl Default for MockPluginFactory {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl SttPluginFactory for MockPluginFactory {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        Ok(Box::new(MockPlugin::new(self.config.clone())))
    }

    fn plugin_info(&self) -> PluginInfo {
        MockPlugin::default().info()
    }

    fn check_requirements(&self) -> Result<(), SttPluginError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_final_event_after_configured_chunks() {
        let mut plugin = MockPlugin::with_delayed_transcription(2, "hello world".to_string());
        assert!(plugin
            .process_audio_segment(&[0i16; 160])
            .await
            .unwrap()
            .is_none());
        let event = plugin
            .process_audio_segment(&[0i16; 160])
            .await
            .unwrap()
            .expect("second chunk should complete the utterance");
        match event {
            TranscriptionEvent::Final { text, .. } => assert_eq!(text, "hello world"),
            _ => panic!("expected Final event"),
        }
    }

    #[tokio::test]
    async fn fails_after_configured_call_count() {
        let mut plugin = MockPlugin::new(MockConfig {
            fail_after_calls: Some(1),
            ..Default::default()
        });
        plugin.process_audio_segment(&[]).await.unwrap();
        let err = plugin.process_audio_segment(&[]).await.unwrap_err();
        assert!(matches!(err, SttPluginError::TranscriptionFailed(_)));
    }
}
