//! Configuration file (§6): a single structured document storing AI
//! settings, dictation window placement, hotkeys, rules, actions, and
//! per-plugin option blobs. Loaded/saved with `toml`, matching the
//! teacher's config-handling stack (`voxflow-foundation` uses the `config`
//! crate for the same TOML-backed style elsewhere in the workspace).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::ai_transform::AiSettings;
use crate::hotkey::HotkeyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPosition {
    ActiveAppCorner,
    ScreenCorner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub position: WindowPosition,
    pub width: u32,
    pub height: u32,
    pub always_shown: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            position: WindowPosition::ActiveAppCorner,
            width: 360,
            height: 120,
            always_shown: false,
        }
    }
}

/// A rule is a lighter-weight text transform than an [`Action`] — no
/// handlers, just a find/replace pass applied to every transcribed
/// segment's text before (or instead of) the AI rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub enabled: bool,
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DictationConfig {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Per-plugin option blobs keyed by plugin name, deserialized lazily
    /// by each plugin via its own `OptionValue` schema.
    #[serde(default)]
    pub plugin_options: HashMap<String, serde_json::Value>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle: None,
            push_to_talk: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl DictationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigLoadError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
