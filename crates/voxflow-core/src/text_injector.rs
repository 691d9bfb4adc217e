//! Text Injector contract (§4.6). The concrete injection mechanism
//! (clipboard paste, synthetic keystrokes, AT-SPI) lives in
//! `voxflow-text-injection` and is out of this core's scope per §1; this
//! module only specifies the interface the Flow Supervisor programs
//! against, matching the capability-set/trait approach of §9 "Plugin
//! polymorphism".

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectorError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("clipboard busy")]
    ClipboardBusy,

    #[error("focus lost")]
    FocusLost,
}

/// Result of the session-start selection probe (§4.6): the selected text
/// (if any), whether a selection existed, and the clipboard contents prior
/// to the probe (so callers can restore it if the probe itself touched the
/// clipboard, e.g. a copy-based selection read).
#[derive(Debug, Clone, Default)]
pub struct SelectionProbeResult {
    pub text: String,
    pub has_selection: bool,
    pub original_clipboard: Option<String>,
}

/// The Flow Supervisor's only window into text injection. Implementations
/// MUST save and restore the user's prior clipboard if they use it (§4.6).
#[async_trait]
pub trait TextInjector: Send + Sync {
    async fn inject(&self, text: &str) -> Result<(), InjectorError>;

    /// Read-only probe called at session start.
    async fn get_selected_text(&self) -> Result<SelectionProbeResult, InjectorError>;

    /// Places `text` on the clipboard without attempting a paste. Used as
    /// the last-resort fallback on injection failure (§7: "text is placed
    /// on the clipboard as a last resort so nothing is lost").
    async fn place_on_clipboard(&self, text: &str) -> Result<(), InjectorError>;
}

/// A [`TextInjector`] that always fails injection but still reports no
/// selection; useful for headless runs and as a default when no platform
/// backend is compiled in.
#[derive(Debug, Default)]
pub struct NoopTextInjector;

#[async_trait]
impl TextInjector for NoopTextInjector {
    async fn inject(&self, _text: &str) -> Result<(), InjectorError> {
        Ok(())
    }

    async fn get_selected_text(&self) -> Result<SelectionProbeResult, InjectorError> {
        Ok(SelectionProbeResult::default())
    }

    async fn place_on_clipboard(&self, _text: &str) -> Result<(), InjectorError> {
        Ok(())
    }
}
