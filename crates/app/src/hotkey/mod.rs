pub mod listener;

use voxflow_core::hotkey::HotkeyEvent;
use tokio::sync::mpsc::Sender;

/// Spawn the hotkey listener (xdg-desktop-portal `GlobalShortcuts`).
/// Events are [`HotkeyEvent`] (§6 hotkey surface).
pub fn spawn_hotkey_listener(event_tx: Sender<HotkeyEvent>) -> tokio::task::JoinHandle<()> {
    listener::spawn_hotkey_listener(event_tx)
}
