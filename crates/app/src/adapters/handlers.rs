//! Executes OS-facing [`Handler`] variants (`OpenUrl`, `OpenApp`, `QuitApp`,
//! `ExecuteShell`) that the Flow Supervisor can't run itself since they
//! reach outside the dictation core into the desktop environment.

use async_trait::async_trait;

use voxflow_core::action::Handler;
use voxflow_core::handler_exec::HandlerExecutor;

pub struct OsHandlerExecutor;

#[async_trait]
impl HandlerExecutor for OsHandlerExecutor {
    async fn execute(&self, handler: &Handler, matched_text: &str) -> bool {
        match handler {
            Handler::OpenUrl { url_template } => {
                spawn_detached("xdg-open", &[expand(url_template, matched_text)]).await
            }
            Handler::OpenApp { app_name_template } => {
                spawn_detached(&expand(app_name_template, matched_text), &[]).await
            }
            Handler::QuitApp { app_name_template } => {
                let app = expand(app_name_template, matched_text);
                spawn_detached("pkill", &[app]).await
            }
            Handler::ExecuteShell { command_template } => {
                spawn_shell(&expand(command_template, matched_text)).await
            }
            // SegmentOp / TransformText / CleanUrl act on the Segment Store
            // text directly; the supervisor handles those itself.
            _ => false,
        }
    }
}

fn expand(template: &str, matched_text: &str) -> String {
    template.replace("{text}", matched_text)
}

async fn spawn_detached(cmd: &str, args: &[String]) -> bool {
    tokio::process::Command::new(cmd)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .is_ok()
}

async fn spawn_shell(command: &str) -> bool {
    tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .is_ok()
}
