//! Handler execution contract. `OpenUrl`/`OpenApp`/`QuitApp`/`ExecuteShell`
//! reach into the OS, which §1 puts out of this core's scope — only the
//! interface is specified here. `SegmentOp`/`TransformText`/`CleanUrl` are
//! pure and run in-process against the [`crate::store::SegmentStore`]
//! directly by the supervisor, never through this trait.

use async_trait::async_trait;

use crate::action::Handler;

/// Whatever posts side effects for OS-facing handlers (open a URL/app,
/// run a shell command, quit an app). Returns whether the handler
/// succeeded, matching §4.7 ("each handler reports success/failure and
/// may set `stop_on_success`").
#[async_trait]
pub trait HandlerExecutor: Send + Sync {
    async fn execute(&self, handler: &Handler, matched_text: &str) -> bool;
}

/// A [`HandlerExecutor`] that never performs OS side effects; used in
/// headless runs and tests. Always reports failure so callers don't
/// mistake a no-op for success.
#[derive(Debug, Default)]
pub struct NoopHandlerExecutor;

#[async_trait]
impl HandlerExecutor for NoopHandlerExecutor {
    async fn execute(&self, _handler: &Handler, _matched_text: &str) -> bool {
        false
    }
}
