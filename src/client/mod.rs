// ABOUTME: Native terminal client driving a session bridge over WebSocket
// Wires the controlling tty, stdin and SIGWINCH into the bridge dispatch loop

pub mod error;
pub mod input;
pub mod runner;
pub mod surface;
pub mod websocket;

pub use error::ClientError;
pub use input::{InputDecoder, LocalEvent};
pub use runner::run_session;
pub use surface::{RawModeGuard, TtySurface};
pub use websocket::WsChannel;

use crate::bridge::{endpoint_for, Channel};
use crate::config::ClientConfig;
use tokio::sync::mpsc;
use tracing::info;

/// Connect the controlling terminal to the session at `url`, or at the
/// configured URL when none is given. Returns once the session has ended.
pub async fn connect(config: &ClientConfig, url: Option<&str>) -> Result<(), ClientError> {
    let target = url
        .map(str::to_string)
        .or_else(|| config.url.clone())
        .ok_or(ClientError::NoEndpoint)?;
    let endpoint = endpoint_for(&target)?;
    info!("Resolved session endpoint {}", endpoint);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    input::spawn_resize_listener(events_tx.clone()).map_err(ClientError::Signal)?;

    let _raw_mode = RawModeGuard::enable().map_err(ClientError::Terminal)?;
    input::spawn_stdin_reader(events_tx);

    let surface = TtySurface::stdout(config.convert_eol);
    let bridge = run_session(surface, &endpoint, events_rx).await;
    info!("Session ended; channel is {}", bridge.channel().ready_state());

    Ok(())
}
