//! Built-in STT plugin implementations

pub mod mock;
pub mod noop;
pub mod whisper_cpp;

pub use mock::MockPlugin;
pub use noop::NoOpPlugin;
pub use whisper_cpp::{WhisperCppPlugin, WhisperCppPluginFactory, WhisperModelType};
