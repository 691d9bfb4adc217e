use voxflow_core::hotkey::HotkeyEvent;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Proxy};

const SHORTCUT_TOGGLE: &str = "voxflow_toggle";
const SHORTCUT_PTT: &str = "voxflow_ptt";

pub struct PortalShortcuts {
    connection: Arc<Connection>,
    portal: Proxy<'static>,
}

impl PortalShortcuts {
    pub async fn new() -> Result<Self, zbus::Error> {
        let connection = Connection::session().await?;
        let portal = Proxy::new(
            &connection,
            "org.freedesktop.portal.Desktop",
            "/org/freedesktop/portal/desktop",
            "org.freedesktop.portal.GlobalShortcuts",
        )
        .await?;

        Ok(PortalShortcuts {
            connection: Arc::new(connection),
            portal,
        })
    }

    async fn wait_request_response(
        &self,
        request_path: &OwnedObjectPath,
        timeout: Duration,
    ) -> Result<(u32, HashMap<String, OwnedValue>), zbus::Error> {
        let req_proxy = Proxy::new(
            &*self.connection,
            "org.freedesktop.portal.Desktop",
            request_path.as_str(),
            "org.freedesktop.portal.Request",
        )
        .await?;

        let mut stream = req_proxy.receive_signal("Response").await?;
        let msg = tokio::time::timeout(timeout, async { StreamExt::next(&mut stream).await })
            .await
            .map_err(|_| {
                zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "portal request timed out",
                )))
            })?
            .ok_or_else(|| {
                zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "portal request stream ended",
                )))
            })?;

        let body: Result<(u32, HashMap<String, OwnedValue>), _> = msg.body();
        match body {
            Ok((status, results)) => Ok((status, results)),
            Err(e) => Err(zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to decode portal Response: {e}"),
            )))),
        }
    }

    pub async fn create_session(&self) -> Result<OwnedObjectPath, zbus::Error> {
        let now_ns = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let handle_token = format!("voxflow_{:x}", now_ns);
        let session_handle_token = format!("session_{:x}", now_ns ^ 0xA5A5_5A5A);

        let mut options: HashMap<String, Value> = HashMap::new();
        options.insert("handle_token".into(), Value::from(handle_token.as_str()));
        options.insert(
            "session_handle_token".into(),
            Value::from(session_handle_token.as_str()),
        );

        let request_handle: OwnedObjectPath = self.portal.call("CreateSession", &(options)).await?;

        let (_status, results) = self
            .wait_request_response(&request_handle, Duration::from_secs(10))
            .await?;

        if let Some(v) = results.get("session_handle") {
            let session_handle: String = v.clone().try_into().map_err(|e| {
                zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid session_handle: {e}"),
                )))
            })?;
            let opath = OwnedObjectPath::try_from(session_handle.as_str()).map_err(|e| {
                zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid session_handle: {e}"),
                )))
            })?;
            Ok(opath)
        } else {
            Err(zbus::Error::InputOutput(Arc::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "missing session_handle in portal response",
            ))))
        }
    }

    pub async fn bind_shortcuts(
        &self,
        session_handle: &OwnedObjectPath,
        shortcuts: Vec<(String, String)>, // (id, description)
    ) -> Result<(), zbus::Error> {
        let mut sc_defs: Vec<(String, HashMap<String, Value>)> = Vec::new();
        for (id, description) in shortcuts.iter() {
            let mut map: HashMap<String, Value> = HashMap::new();
            map.insert("description".into(), Value::from(description.as_str()));
            sc_defs.push((id.clone(), map));
        }

        let parent_window = "";
        let mut options: HashMap<String, Value> = HashMap::new();
        let now_ns2 = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        options.insert(
            "handle_token".into(),
            Value::from(format!("bind_{:x}", now_ns2 & 0xffff)),
        );

        let request_handle: OwnedObjectPath = self
            .portal
            .call(
                "BindShortcuts",
                &(session_handle.clone(), sc_defs, parent_window, options),
            )
            .await?;

        let (_status, _results) = self
            .wait_request_response(&request_handle, Duration::from_secs(15))
            .await?;
        Ok(())
    }
}

/// Spawn the xdg-desktop-portal `GlobalShortcuts` listener and translate its
/// `Activated`/`Deactivated` signals into [`HotkeyEvent`]s. Registers both
/// shortcut ids up front; which ones actually fire depends on what the user
/// bound in the portal's configuration dialog (toggle vs. push-to-talk is a
/// supervisor-level distinction, not a listener-level one).
pub fn spawn_hotkey_listener(event_tx: Sender<HotkeyEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let shortcuts = match PortalShortcuts::new().await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("GlobalShortcuts portal unavailable: {e}");
                return;
            }
        };

        let session_handle = match shortcuts.create_session().await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!("Failed to create GlobalShortcuts session: {e}");
                return;
            }
        };

        if let Err(e) = shortcuts
            .bind_shortcuts(
                &session_handle,
                vec![
                    (SHORTCUT_TOGGLE.to_string(), "VoxFlow: toggle dictation".to_string()),
                    (SHORTCUT_PTT.to_string(), "VoxFlow: push-to-talk".to_string()),
                ],
            )
            .await
        {
            tracing::error!("Failed to bind shortcuts: {e}");
            return;
        }

        let mut activated_stream = match shortcuts.portal.receive_signal("Activated").await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to subscribe to Activated signal: {e}");
                return;
            }
        };
        let mut deactivated_stream = match shortcuts.portal.receive_signal("Deactivated").await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to subscribe to Deactivated signal: {e}");
                return;
            }
        };

        tracing::info!(
            "GlobalShortcuts listener ready (session: {})",
            session_handle.as_str()
        );

        loop {
            tokio::select! {
                Some(msg) = futures::StreamExt::next(&mut activated_stream) => {
                    if let Ok((session_o, shortcut_id, _ts, _opts)) = msg.body::<(OwnedObjectPath, String, u64, HashMap<String, OwnedValue>)>() {
                        if session_o.as_str() != session_handle.as_str() {
                            continue;
                        }
                        let event = match shortcut_id.as_str() {
                            SHORTCUT_TOGGLE => Some(HotkeyEvent::ToggleTrigger),
                            SHORTCUT_PTT => Some(HotkeyEvent::PushToTalkDown),
                            _ => None,
                        };
                        if let Some(event) = event {
                            let _ = event_tx.send(event).await;
                        }
                    }
                }
                Some(msg) = futures::StreamExt::next(&mut deactivated_stream) => {
                    if let Ok((session_o, shortcut_id, _ts, _opts)) = msg.body::<(OwnedObjectPath, String, u64, HashMap<String, OwnedValue>)>() {
                        if session_o.as_str() == session_handle.as_str() && shortcut_id == SHORTCUT_PTT {
                            let _ = event_tx.send(HotkeyEvent::PushToTalkUp).await;
                        }
                    }
                }
                else => {
                    tracing::warn!("GlobalShortcuts signal streams ended; exiting listener");
                    break;
                }
            }
        }
    })
}
