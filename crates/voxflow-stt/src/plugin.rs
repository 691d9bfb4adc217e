//! Transcription Plugin Contract.
//!
//! Every recognizer (local batch, local streaming, cloud) implements
//! [`SttPlugin`]. Any backend — Vosk, whisper.cpp, a cloud API — plugs
//! into the same pipeline through this one shape; the Flow Supervisor
//! programs against the trait, never against a concrete backend.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use voxflow_foundation::secure_storage::SecureStore;

use crate::types::{PluginUpdateEvent, TranscriptionConfig, TranscriptionEvent};

/// Errors a plugin can report at any lifecycle or work step.
#[derive(Debug, Error)]
pub enum SttPluginError {
    /// `initialize()` / `on_activated()` failure: binary missing, dependency
    /// not installed, or the backend cannot start at all.
    #[error("plugin unavailable: {reason}")]
    Unavailable { reason: String },

    /// `on_activated()` failure: the model file is missing or could not be
    /// downloaded.
    #[error("model missing: {reason}")]
    ModelMissing { reason: String },

    /// `on_activated()` failure: API key rejected by the backend.
    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    /// Option values failed `verify_options` or schema validation.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// A single segment failed to transcribe. Per the error handling
    /// design, this is not retried; the segment is marked failed and the
    /// session continues.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("checksum verification failed: {0}")]
    ChecksumFailed(String),

    #[error("unload failed: {0}")]
    UnloadFailed(String),

    #[error("other error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Capabilities that are fixed per plugin (not per-instance).
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginCapabilities {
    pub supports_realtime: bool,
    pub supports_batch: bool,
    pub requires_api_key: bool,
    pub requires_model_download: bool,
    /// When true, the plugin performs its own rewrite of the recognized
    /// text. The Flow Supervisor skips Transforming and user-defined rules
    /// do not run for this session (§4.7 Action interception).
    pub overrides_ai_transformation: bool,
}

#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// One configurable option exposed by a plugin's `schema()`.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub key: String,
    pub option_type: OptionType,
    pub default: OptionValue,
    pub category: OptionCategory,
    pub constraints: OptionConstraints,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionType {
    String,
    Number,
    Bool,
    Select { choices: Vec<String> },
    ModelSelect { choices: Vec<String> },
    /// Values of this type are never stored in the plain config record;
    /// see [`SttPlugin::secure_value`].
    ApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionCategory {
    Basic,
    Advanced,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Default)]
pub struct OptionConstraints {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

/// Progress callback payload for long-running model downloads.
#[derive(Debug, Clone)]
pub struct ModelProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub message: String,
}

/// Channel-based stand-in for the "ui_callbacks" the design notes describe:
/// `on_update`/`on_progress`/`on_log` are modeled as senders rather than
/// boxed closures, consistent with the rest of the pipeline's channel-first
/// concurrency style.
#[derive(Clone, Default)]
pub struct UiCallbacks {
    pub on_update: Option<mpsc::UnboundedSender<PluginUpdateEvent>>,
    pub on_progress: Option<mpsc::UnboundedSender<ModelProgress>>,
    pub on_log: Option<mpsc::UnboundedSender<String>>,
}

impl UiCallbacks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn update(&self, event: PluginUpdateEvent) {
        if let Some(tx) = &self.on_update {
            let _ = tx.send(event);
        }
    }

    pub fn progress(&self, progress: ModelProgress) {
        if let Some(tx) = &self.on_progress {
            let _ = tx.send(progress);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        if let Some(tx) = &self.on_log {
            let _ = tx.send(message.into());
        }
    }
}

impl Debug for UiCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiCallbacks").finish_non_exhaustive()
    }
}

/// The transcription plugin contract. Two-phase lifecycle keeps app
/// startup cheap regardless of how many plugins are installed: every
/// plugin's `initialize()` runs at launch, but only the active plugin's
/// `on_activated()` ever does heavy work.
#[async_trait]
pub trait SttPlugin: Send + Sync + Debug {
    fn info(&self) -> PluginInfo;
    fn capabilities(&self) -> PluginCapabilities;

    /// Cheap viability check: is the binary present, is the dependency
    /// importable. Must not load a model or open a network connection.
    async fn initialize(&mut self) -> Result<(), SttPluginError>;

    /// Heavy work: load the model, open a stream, validate an API key,
    /// ensure the model is downloaded. Only called for the plugin the
    /// user actually selected.
    async fn on_activated(&mut self, ui: &UiCallbacks) -> Result<(), SttPluginError>;

    /// Release resources, stop workers. Does not destroy the plugin; it
    /// may be reactivated later.
    async fn on_deactivated(&mut self) -> Result<(), SttPluginError>;

    /// Final teardown, called once before the plugin is dropped.
    async fn destroy(&mut self) -> Result<(), SttPluginError> {
        Ok(())
    }

    /// Realtime plugins only: begin an ingest channel. `on_update` fires
    /// for every text update the plugin produces.
    async fn start_stream(&mut self, ui: &UiCallbacks) -> Result<(), SttPluginError> {
        let _ = ui;
        Err(SttPluginError::Unavailable {
            reason: "plugin does not support realtime streaming".into(),
        })
    }

    /// Realtime: feed one segment's audio. Failures are reported via
    /// `on_update`'s error path or by returning `Err`.
    async fn process_audio_segment(
        &mut self,
        samples: &[i16],
    ) -> Result<Option<TranscriptionEvent>, SttPluginError> {
        let _ = samples;
        Err(SttPluginError::Unavailable {
            reason: "plugin does not support realtime streaming".into(),
        })
    }

    /// Batch: transcribe a complete file on disk, returning its text.
    async fn transcribe_file(&mut self, path: &Path) -> Result<String, SttPluginError> {
        let _ = path;
        Err(SttPluginError::Unavailable {
            reason: "plugin does not support batch transcription".into(),
        })
    }

    /// Idempotent: safe to call even if no stream is active.
    async fn stop_stream(&mut self) -> Result<(), SttPluginError> {
        Ok(())
    }

    /// The configurable option schema this plugin exposes.
    fn schema(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Validate a candidate option set without applying it.
    fn verify_options(&self, values: &HashMap<String, OptionValue>) -> (bool, Vec<String>) {
        let mut errors = Vec::new();
        for spec in self.schema() {
            if spec.constraints.required && !values.contains_key(&spec.key) {
                errors.push(format!("missing required option '{}'", spec.key));
            }
        }
        (errors.is_empty(), errors)
    }

    /// Apply a verified option set, possibly triggering a model swap.
    async fn update_options(
        &mut self,
        values: HashMap<String, OptionValue>,
        ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        let _ = (values, ui);
        Ok(())
    }

    /// Idempotent: download the model if missing, otherwise return
    /// immediately.
    async fn ensure_model(
        &mut self,
        values: &HashMap<String, OptionValue>,
        ui: &UiCallbacks,
    ) -> Result<(), SttPluginError> {
        let _ = (values, ui);
        Ok(())
    }

    /// Fetch an `api-key`-typed option's value from secure storage. Plugins
    /// must go through this rather than reading the plain config record —
    /// the config record never holds the secret itself.
    fn secure_value(&self, store: &dyn SecureStore, key: &str) -> Option<String> {
        store.get(&format!("{}.{key}", self.info().id)).ok().flatten()
    }
}

/// Factory for creating STT plugins
pub trait SttPluginFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn SttPlugin>, SttPluginError>;
    fn plugin_info(&self) -> PluginInfo;
    fn check_requirements(&self) -> Result<(), SttPluginError>;
}

/// Registry for managing multiple STT plugins
#[derive(Default)]
pub struct SttPluginRegistry {
    factories: Vec<Box<dyn SttPluginFactory>>,
    preferred_order: Vec<String>,
}

impl SttPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn SttPluginFactory>) {
        self.factories.push(factory);
    }

    pub fn set_preferred_order(&mut self, order: Vec<String>) {
        self.preferred_order = order;
    }

    pub fn available_plugins(&self) -> Vec<PluginInfo> {
        self.factories.iter().map(|f| f.plugin_info()).collect()
    }

    pub fn create_plugin(&self, id: &str) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        self.factories
            .iter()
            .find(|f| f.plugin_info().id == id)
            .ok_or_else(|| SttPluginError::Unavailable {
                reason: format!("plugin '{id}' not registered"),
            })?
            .create()
    }

    /// Try the preferred order first, then fall back to any plugin whose
    /// requirements are met.
    pub fn create_best_available(&self) -> Result<Box<dyn SttPlugin>, SttPluginError> {
        for plugin_id in &self.preferred_order {
            if let Ok(plugin) = self.create_plugin(plugin_id) {
                return Ok(plugin);
            }
        }
        for factory in &self.factories {
            if factory.check_requirements().is_ok() {
                if let Ok(plugin) = factory.create() {
                    return Ok(plugin);
                }
            }
        }
        Err(SttPluginError::Unavailable {
            reason: "no STT plugins available".to_string(),
        })
    }
}
