//! Builds the live capture -> VAD -> Flow Supervisor pipeline and wires the
//! hotkey listener into it. This module is the only place that constructs
//! concrete backends; the Flow Supervisor itself only ever sees the
//! `voxflow-core` contracts (§3 Ownership, §4.7).

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use voxflow_audio::capture_buffer::CaptureLimits;
use voxflow_audio::chunker::{AudioChunker, ChunkerConfig};
use voxflow_audio::constants::{FRAME_SIZE_SAMPLES, SAMPLE_RATE_HZ};
use voxflow_audio::ring_buffer::AudioRingBuffer;
use voxflow_audio::{AudioCaptureThread, FrameReader, ResamplerQuality, SharedAudioFrame};
use voxflow_core::config::DictationConfig;
use voxflow_core::hotkey::HotkeyEvent;
use voxflow_core::{FlowSupervisor, HttpAiTransformer};
use voxflow_foundation::{AudioConfig, AudioError, FileSecureStore, SecureStore};
use voxflow_stt::plugin::{SttPluginError, SttPluginRegistry, UiCallbacks};
use voxflow_vad_silero::{SileroConfig, SileroEngine};

use crate::adapters::capture::{spawn_segmenter, MicCaptureControl};
use crate::adapters::handlers::OsHandlerExecutor;
use crate::hotkey::spawn_hotkey_listener;

/// Startup failures, kept as the original error rather than flattened to a
/// string so `main` can map them onto the CLI exit codes of §6.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Stt(#[from] SttPluginError),

    #[error("no usable VAD engine: {0}")]
    Vad(String),
}

/// Everything the binary keeps alive for the process lifetime. Dropping
/// this without calling `shutdown` leaves the capture thread running;
/// `main` always routes through `shutdown` on the way out.
pub struct AppHandle {
    pub supervisor: Arc<FlowSupervisor>,
    capture_thread: Option<AudioCaptureThread>,
    chunker_handle: JoinHandle<()>,
    bridge_handle: JoinHandle<()>,
    segmenter_handle: JoinHandle<()>,
    hotkey_listener_handle: JoinHandle<()>,
    hotkey_forward_handle: JoinHandle<()>,
}

impl AppHandle {
    pub async fn shutdown(mut self) {
        self.hotkey_listener_handle.abort();
        self.hotkey_forward_handle.abort();
        self.segmenter_handle.abort();
        self.bridge_handle.abort();
        self.chunker_handle.abort();
        if let Some(thread) = self.capture_thread.take() {
            let _ = tokio::task::spawn_blocking(move || thread.stop()).await;
        }
    }
}

/// Secure storage lives at a fixed location under the user's config
/// directory; every plugin and the AI transformer share the one store,
/// namespaced by key prefix (§6 external interface).
fn open_secure_store() -> Option<FileSecureStore> {
    let dir = dirs_path()?;
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("failed to create secure storage directory: {e}");
        return None;
    }
    match FileSecureStore::open(dir.join("secrets.bin")) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("failed to open secure storage: {e}");
            None
        }
    }
}

fn dirs_path() -> Option<std::path::PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| std::path::PathBuf::from(h).join(".config")))
        .map(|p| p.join("voxflow"))
}

fn build_stt_registry() -> SttPluginRegistry {
    let mut registry = SttPluginRegistry::new();
    #[cfg(feature = "vosk")]
    registry.register(Box::new(voxflow_stt_vosk::VoskPluginFactory::new()));
    #[cfg(feature = "whisper")]
    registry.register(Box::new(voxflow_stt_whisper::WhisperPluginFactory::default()));
    registry.set_preferred_order(vec!["vosk".to_string(), "whisper-cpp".to_string()]);
    registry
}

async fn build_stt_plugin() -> Result<Box<dyn voxflow_stt::plugin::SttPlugin>, RuntimeError> {
    let mut plugin = build_stt_registry().create_best_available()?;
    plugin.initialize().await?;
    plugin.on_activated(&UiCallbacks::none()).await?;
    Ok(plugin)
}

/// Spawns the capture thread, the chunker, the VAD segmenter, the hotkey
/// listener, and the Flow Supervisor that ties them together. Returns once
/// the capture device has produced its first frame (or fails outright).
pub async fn start(
    config: DictationConfig,
    device: Option<String>,
) -> Result<AppHandle, RuntimeError> {
    let audio_config = AudioConfig::default();
    let ring = AudioRingBuffer::new(audio_config.capture_buffer_samples);
    let (audio_producer, audio_consumer) = ring.split();

    let (capture_thread, device_cfg, device_cfg_rx) =
        AudioCaptureThread::spawn(audio_config, audio_producer, device)?;

    let frame_reader = FrameReader::new(
        audio_consumer,
        device_cfg.sample_rate,
        device_cfg.channels,
        audio_config.capture_buffer_samples,
        None,
    );

    let chunker_cfg = ChunkerConfig {
        frame_size_samples: FRAME_SIZE_SAMPLES,
        sample_rate_hz: SAMPLE_RATE_HZ,
        resampler_quality: ResamplerQuality::Balanced,
    };
    let (chunker_tx, _) = broadcast::channel(200);
    let chunker = AudioChunker::new(frame_reader, chunker_tx.clone(), chunker_cfg)
        .with_device_config(device_cfg_rx);
    let chunker_handle = chunker.spawn();

    // The chunker emits f32 frames sized for resampling math; downstream
    // VAD/capture consumers want the plain i16 PCM a mic actually produces.
    let (shared_tx, _) = broadcast::channel::<SharedAudioFrame>(200);
    let bridge_handle = {
        let shared_tx = shared_tx.clone();
        let mut chunker_rx = chunker_tx.subscribe();
        tokio::spawn(async move {
            loop {
                match chunker_rx.recv().await {
                    Ok(frame) => {
                        let samples: Arc<[i16]> = frame
                            .samples
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect::<Vec<_>>()
                            .into();
                        let _ = shared_tx.send(SharedAudioFrame {
                            samples,
                            timestamp: frame.timestamp,
                            sample_rate: frame.sample_rate,
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("frame bridge lagged, dropped {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };

    let vad_engine: Box<dyn voxflow_vad::VadEngine> =
        Box::new(SileroEngine::new(SileroConfig::default()).map_err(RuntimeError::Vad)?);
    let capture = Arc::new(MicCaptureControl::new(CaptureLimits::default(), vad_engine));

    let stt_plugin = build_stt_plugin().await?;

    let secure_store = open_secure_store();
    let ai_transformer: Option<Arc<dyn voxflow_core::AiTransformer>> = if config.ai.enabled {
        let api_key = secure_store
            .as_ref()
            .and_then(|store| store.get("ai.api_key").ok().flatten());
        Some(Arc::new(HttpAiTransformer::new(config.ai.clone(), api_key)))
    } else {
        None
    };

    #[cfg(feature = "text-injection")]
    let injector: Arc<dyn voxflow_core::TextInjector> = Arc::new(
        crate::adapters::injector::DesktopTextInjector::new(
            voxflow_text_injection::StrategyManager::new(
                voxflow_text_injection::InjectionConfig::default(),
            ),
        ),
    );
    #[cfg(not(feature = "text-injection"))]
    let injector: Arc<dyn voxflow_core::TextInjector> = Arc::new(voxflow_core::NoopTextInjector);

    let handler_executor: Arc<dyn voxflow_core::HandlerExecutor> = Arc::new(OsHandlerExecutor);

    let supervisor = Arc::new(FlowSupervisor::new(
        config.actions.clone(),
        capture.clone(),
        stt_plugin,
        ai_transformer,
        injector,
        handler_executor,
    ));

    let segmenter_handle =
        spawn_segmenter(shared_tx.subscribe(), capture.clone(), supervisor.clone());

    let (hotkey_tx, mut hotkey_rx) = mpsc::channel::<HotkeyEvent>(32);
    let hotkey_listener_handle = spawn_hotkey_listener(hotkey_tx);
    let hotkey_forward_handle = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            while let Some(event) = hotkey_rx.recv().await {
                supervisor.handle_hotkey(event).await;
            }
        })
    };

    Ok(AppHandle {
        supervisor,
        capture_thread: Some(capture_thread),
        chunker_handle,
        bridge_handle,
        segmenter_handle,
        hotkey_listener_handle,
        hotkey_forward_handle,
    })
}
