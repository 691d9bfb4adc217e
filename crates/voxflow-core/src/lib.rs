//! Dictation core: the Segment Store, Action/Handler model, AI Transformer
//! and Text Injector contracts, and the Flow Supervisor state machine that
//! ties them together with capture and transcription.
//!
//! Everything platform-specific — the real microphone thread, the concrete
//! transcription backend, the OS text-injection mechanism, the hotkey
//! backend — lives outside this crate. `voxflow-core` only fixes the
//! contracts those pieces must satisfy and the state machine that drives
//! them; see [`supervisor::FlowSupervisor`].

pub mod action;
pub mod ai_transform;
pub mod capture_control;
pub mod config;
pub mod handler_exec;
pub mod hotkey;
pub mod segment;
pub mod session;
pub mod store;
pub mod supervisor;
pub mod text_injector;

pub use action::{Action, ActionTiming, Handler, HandlerEntry, MatchPattern, SegmentOp};
pub use ai_transform::{AiSettings, AiTransformer, HttpAiTransformer, TransformError, TransformRequest};
pub use capture_control::{CaptureControl, CaptureControlError};
pub use config::{ConfigLoadError, DictationConfig, Rule, WindowConfig, WindowPosition};
pub use handler_exec::{HandlerExecutor, NoopHandlerExecutor};
pub use hotkey::{Accelerator, AcceleratorParseError, HotkeyConfig, HotkeyEvent, Modifier};
pub use segment::{Segment, SegmentId, SegmentIdAllocator};
pub use session::{DictationMode, FlowStatus, Session};
pub use store::{SegmentStore, SnapshotListener};
pub use supervisor::{FlowSupervisor, SupervisorError};
pub use text_injector::{InjectorError, NoopTextInjector, SelectionProbeResult, TextInjector};
