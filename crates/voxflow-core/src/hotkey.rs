//! Hotkey surface (§6). The supervisor reacts to two trigger shapes —
//! Toggle and Push-to-Talk — regardless of which OS-level backend posted
//! them (global accelerator portal, kglobalaccel, raw X11 grab, ...); only
//! the event shape is specified here, the backend is an external
//! collaborator per §1.

use serde::{Deserialize, Serialize};

/// A single key event from whichever hotkey backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The toggle accelerator fired once.
    ToggleTrigger,
    /// The push-to-talk accelerator was pressed down.
    PushToTalkDown,
    /// The push-to-talk accelerator was released.
    PushToTalkUp,
}

/// A modifier+key accelerator (§6): at most one non-modifier key.
/// Modifier equivalences: `CommandOrControl`, `Control`, `Alt`/`Option`,
/// `Shift`, `Meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accelerator {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    CommandOrControl,
    Control,
    Alt,
    Shift,
    Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub toggle: Option<Accelerator>,
    pub push_to_talk: Option<Accelerator>,
}

#[derive(Debug, thiserror::Error)]
pub enum AcceleratorParseError {
    #[error("accelerator '{0}' has no key component")]
    MissingKey(String),

    #[error("accelerator '{0}' has more than one non-modifier key")]
    MultipleKeys(String),

    #[error("unrecognized modifier '{0}'")]
    UnknownModifier(String),
}

impl Accelerator {
    /// Parses `"CommandOrControl+Shift+D"`-style strings. Exactly one
    /// non-modifier token is required (§6: "a single hotkey may not
    /// include more than one non-modifier key").
    pub fn parse(spec: &str) -> Result<Self, AcceleratorParseError> {
        let mut modifiers = Vec::new();
        let mut key = None;
        for token in spec.split('+').map(str::trim) {
            match token {
                "CommandOrControl" | "CmdOrCtrl" => modifiers.push(Modifier::CommandOrControl),
                "Control" | "Ctrl" => modifiers.push(Modifier::Control),
                "Alt" | "Option" => modifiers.push(Modifier::Alt),
                "Shift" => modifiers.push(Modifier::Shift),
                "Meta" | "Super" | "Cmd" => modifiers.push(Modifier::Meta),
                "" => continue,
                other => {
                    if key.is_some() {
                        return Err(AcceleratorParseError::MultipleKeys(spec.to_string()));
                    }
                    key = Some(other.to_string());
                }
            }
        }
        let key = key.ok_or_else(|| AcceleratorParseError::MissingKey(spec.to_string()))?;
        Ok(Self { modifiers, key })
    }
}
