//! Bridges [`voxflow_text_injection::StrategyManager`] (the lower-level,
//! backend-probing injector) to the Flow Supervisor's higher-level
//! [`TextInjector`] contract, which also needs selection probing and a
//! clipboard-placement fallback the strategy manager doesn't expose.

use async_trait::async_trait;

use voxflow_core::text_injector::{InjectorError, SelectionProbeResult, TextInjector};
use voxflow_text_injection::error::{InjectionError, UnavailableCause};
use voxflow_text_injection::subprocess::{run_tool_with_stdin_timeout, run_tool_with_timeout};
use voxflow_text_injection::{InjectionMetrics, StrategyManager};

const CLIPBOARD_TOOL_TIMEOUT_MS: u64 = 500;

pub struct DesktopTextInjector {
    manager: StrategyManager,
}

impl DesktopTextInjector {
    pub fn new(manager: StrategyManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl TextInjector for DesktopTextInjector {
    async fn inject(&self, text: &str) -> Result<(), InjectorError> {
        let mut metrics = InjectionMetrics::default();
        self.manager
            .inject_with_fail_fast(text, &mut metrics)
            .await
            .map(|_| ())
            .map_err(map_injection_error)
    }

    /// Best-effort: reads the PRIMARY selection via whichever clipboard
    /// tool is on `$PATH`. Returns "no selection" rather than an error when
    /// neither tool is available — a missing selection is the common case,
    /// not a failure.
    async fn get_selected_text(&self) -> SelectionProbeResult {
        for (cmd, args) in [
            ("wl-paste", &["--primary", "--no-newline"][..]),
            ("xclip", &["-selection", "primary", "-o"][..]),
        ] {
            if let Ok(text) = run_tool_with_timeout(cmd, args, CLIPBOARD_TOOL_TIMEOUT_MS).await {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return SelectionProbeResult {
                        text: trimmed.to_string(),
                        has_selection: true,
                        original_clipboard: None,
                    };
                }
            }
        }
        SelectionProbeResult::default()
    }

    async fn place_on_clipboard(&self, text: &str) -> Result<(), InjectorError> {
        if run_tool_with_stdin_timeout("wl-copy", &[], text.as_bytes(), CLIPBOARD_TOOL_TIMEOUT_MS)
            .await
            .is_ok()
        {
            return Ok(());
        }
        run_tool_with_stdin_timeout(
            "xclip",
            &["-selection", "clipboard"],
            text.as_bytes(),
            CLIPBOARD_TOOL_TIMEOUT_MS,
        )
        .await
        .map_err(|_| InjectorError::ClipboardBusy)
    }
}

fn map_injection_error(err: InjectionError) -> InjectorError {
    match err {
        InjectionError::Unavailable {
            cause: UnavailableCause::Dbus | UnavailableCause::AtspiRegistry,
            ..
        } => InjectorError::PermissionDenied,
        InjectionError::Unavailable { .. } | InjectionError::PreconditionNotMet { .. } => {
            InjectorError::FocusLost
        }
        InjectionError::Timeout { .. } => InjectorError::FocusLost,
        InjectionError::Transient { .. } | InjectionError::ClipboardRestoreMismatch { .. } => {
            InjectorError::ClipboardBusy
        }
        InjectionError::Io { .. } | InjectionError::Other(_) => InjectorError::PermissionDenied,
    }
}
