// ABOUTME: One WebSocket connection relayed to one PTY child
// Binary frames are keystrokes, text frames are control messages

use crate::bridge::{ControlMessage, Geometry};
use crate::server::pty::{PtyCommand, PtyProcess};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix for notices the host writes into the session itself.
pub const NOTICE_PREFIX: &str = "[termlink]";

/// Relay `socket` to a freshly spawned `command` until either side ends.
pub async fn relay(socket: WebSocket, command: PtyCommand) {
    let session_id = Uuid::new_v4();
    info!(%session_id, program = %command.program, "Session started");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let (pty, mut output) = match PtyProcess::spawn(&command) {
        Ok(spawned) => spawned,
        Err(e) => {
            warn!(%session_id, "Failed to start process: {}", e);
            let notice = format!("\r\n{NOTICE_PREFIX} failed to start process: {e}\r\n");
            let _ = ws_tx.send(Message::Text(notice.into())).await;
            let _ = ws_tx.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            chunk = output.recv() => match chunk {
                Some(bytes) => {
                    if ws_tx.send(Message::Binary(bytes.into())).await.is_err() {
                        debug!(%session_id, "Client went away while sending output");
                        break;
                    }
                }
                None => {
                    debug!(%session_id, "PTY output ended");
                    let _ = ws_tx.close().await;
                    break;
                }
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Binary(data))) => {
                    if let Err(e) = pty.write_input(&data) {
                        warn!(%session_id, "PTY input closed: {}", e);
                        break;
                    }
                }
                Some(Ok(Message::Text(text))) => apply_control(&pty, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(%session_id, "WebSocket error: {}", e);
                    break;
                }
            },
        }
    }

    // Killing and reaping can block; keep it off the runtime workers.
    let reaped = tokio::task::spawn_blocking(move || {
        let mut pty = pty;
        pty.terminate();
    })
    .await;
    if let Err(e) = reaped {
        warn!(%session_id, "Failed to reap child: {}", e);
    }
    info!(%session_id, "Session ended");
}

/// Resize geometry requested by a text frame, if it is a usable one.
pub fn requested_geometry(text: &str) -> Option<Geometry> {
    match ControlMessage::parse(text)? {
        ControlMessage::Resize { cols, rows } if cols > 0 && rows > 0 => {
            Some(Geometry::new(cols, rows))
        }
        ControlMessage::Resize { .. } => None,
    }
}

fn apply_control(pty: &PtyProcess, text: &str) {
    let Some(geometry) = requested_geometry(text) else {
        debug!("Ignoring control message: {}", text);
        return;
    };
    if let Err(e) = pty.resize(geometry) {
        warn!("PTY resize error: {}", e);
    }
}
