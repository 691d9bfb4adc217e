// Logging behavior:
// - Writes logs to both stderr and a daily-rotated file at logs/voxflow.log.
// - Default log level is INFO to reduce verbosity. Control via RUST_LOG environment variable:
//   * RUST_LOG=info                     # Standard logging (default, recommended)
//   * RUST_LOG=debug                    # Verbose debugging (includes silence detection)
//   * RUST_LOG=trace                    # Maximum verbosity (includes every audio chunk)
//   * RUST_LOG=voxflow=info,stt_debug=trace  # Fine-grained per-module control
// - The logs/ directory is created on startup if missing; file output uses a non-blocking writer.
// - File layer disables ANSI to keep logs clean for analysis.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use std::time::SystemTime;

use anyhow::Context;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voxflow_app::runtime::{self, RuntimeError};
use voxflow_app::Settings;
use voxflow_audio::DeviceManager;
use voxflow_core::config::ConfigLoadError;
use voxflow_foundation::{AppState, HealthMonitor, ShutdownHandler, StateManager};
use voxflow_stt::plugin::SttPluginError;

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>>
{
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "voxflow.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // Default to INFO level to reduce verbosity. Use RUST_LOG to override:
    // - RUST_LOG=trace                    # Maximum verbosity (includes all audio chunk logs)
    // - RUST_LOG=debug                    # Verbose debugging (includes silence detection)
    // - RUST_LOG=info                     # Standard logging (default, recommended)
    // - RUST_LOG=voxflow=info,stt_debug=trace  # Fine-grained control per module
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_writer(non_blocking_file).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

/// Prune rotated log files in `logs/` older than `retention_days` days.
/// If `retention_days` is `Some(0)` pruning is disabled. Default is 7 days when `None`.
fn prune_old_logs(retention_days: Option<u64>) {
    let retention = retention_days.unwrap_or(7);
    if retention == 0 {
        tracing::debug!("Log retention disabled (retention_days=0)");
        return;
    }

    let cutoff = match SystemTime::now().checked_sub(Duration::from_secs(retention * 24 * 60 * 60))
    {
        Some(t) => t,
        None => return,
    };

    let logs_dir = Path::new("logs");
    if !logs_dir.exists() {
        return;
    }

    match fs::read_dir(logs_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    // Only consider rotated files with date suffix like `voxflow.log.YYYY-MM-DD`
                    if name.starts_with("voxflow.log.") {
                        if let Ok(meta) = entry.metadata() {
                            if let Ok(modified) = meta.modified() {
                                if modified < cutoff {
                                    if let Err(e) = fs::remove_file(&path) {
                                        tracing::warn!(
                                            "Failed to remove old log {}: {}",
                                            path.display(),
                                            e
                                        );
                                    } else {
                                        tracing::info!("Removed old log file: {}", path.display());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        Err(e) => tracing::warn!("Failed to read logs directory for pruning: {}", e),
    }
}

fn config_path() -> PathBuf {
    std::env::var_os("VOXFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let base = std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
                .unwrap_or_else(|| PathBuf::from("."));
            base.join("voxflow").join("config.toml")
        })
}

#[derive(Parser, Debug)]
#[command(name = "voxflow", author, version, about = "VoxFlow voice pipeline")]
struct Cli {
    /// List available input devices and exit
    #[arg(long = "list-devices")]
    list_devices: bool,

    /// Capture device name to use instead of the system default
    #[arg(long = "device")]
    device: Option<String>,

    /// Path to the config.toml to load (defaults to $XDG_CONFIG_HOME/voxflow/config.toml)
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

/// Loads the config file, distinguishing "doesn't exist yet" (use defaults)
/// from "exists but is broken" (a usage error, §6 exit code `1`).
fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    match Settings::load(path) {
        Ok(settings) => Ok(settings),
        Err(ConfigLoadError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no config at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => Err(e).with_context(|| format!("failed to load config at {}", path.display())),
    }
}

async fn run() -> anyhow::Result<()> {
    // Give PipeWire better routing hints if using its ALSA bridge (Linux only)
    #[cfg(target_os = "linux")]
    std::env::set_var(
        "PIPEWIRE_PROPS",
        "{ application.name=VoxFlow media.role=capture }",
    );
    let _log_guard = init_logging().map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    // Prune old rotated logs. Set VOXFLOW_LOG_RETENTION_DAYS=0 to disable pruning.
    let retention_days = std::env::var("VOXFLOW_LOG_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());
    prune_old_logs(retention_days);
    tracing::info!("Starting VoxFlow application");

    let cli = Cli::parse();

    if cli.list_devices {
        let dm = DeviceManager::new().context("failed to open audio host")?;
        tracing::info!("CPAL host: {:?}", dm.host_id());
        let devices = dm.enumerate_devices();
        println!("Input devices (host: {:?}):", dm.host_id());
        for d in devices {
            let def = if d.is_default { " (default)" } else { "" };
            println!("- {}{}", d.name, def);
        }
        return Ok(());
    }

    let path = cli.config.unwrap_or_else(config_path);
    let settings = load_settings(&path)?;

    let state_manager = StateManager::new();
    let _health_monitor = HealthMonitor::new(Duration::from_secs(10)).start();
    let shutdown = ShutdownHandler::new().install().await;

    state_manager.transition(AppState::Running)?;
    tracing::info!("Application state: Running");

    let app = runtime::start(settings, cli.device).await?;

    tokio::select! {
        _ = shutdown.wait() => {
            tracing::debug!("Shutdown signal received");
        }
        _ = async {
            let mut status_rx = app.supervisor.subscribe_status();
            loop {
                if status_rx.changed().await.is_err() {
                    break;
                }
                tracing::debug!(status = ?*status_rx.borrow(), "flow status changed");
            }
        } => {}
    }

    tracing::debug!("Beginning graceful shutdown");
    state_manager.transition(AppState::Stopping)?;
    app.shutdown().await;
    state_manager.transition(AppState::Stopped)?;
    tracing::debug!("Shutdown complete");

    Ok(())
}

/// Maps a top-level failure onto the CLI exit codes of §6. Anything not
/// named there (audio device errors, an unusable VAD model) falls back to
/// a generic non-zero code rather than inventing a new one.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<ConfigLoadError>().is_some() {
        return ExitCode::from(1);
    }
    if let Some(runtime_err) = err.downcast_ref::<RuntimeError>() {
        return match runtime_err {
            RuntimeError::Stt(SttPluginError::AuthFailed { .. }) => ExitCode::from(3),
            RuntimeError::Stt(SttPluginError::TranscriptionFailed(_)) => ExitCode::from(4),
            RuntimeError::Stt(_) => ExitCode::from(2),
            RuntimeError::Audio(_) | RuntimeError::Vad(_) => ExitCode::from(1),
        };
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            exit_code_for(&e)
        }
    }
}
