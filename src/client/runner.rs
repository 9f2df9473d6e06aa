// ABOUTME: Single dispatch loop feeding socket and local events into the bridge
// Every handler runs to completion before the next event is taken

use super::input::LocalEvent;
use super::websocket::{open_stream, split, to_inbound, WsChannel};
use crate::bridge::{BridgeEvent, SessionBridge, TerminalSurface};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tracing::{debug, info};
use url::Url;

/// How long the writer gets to flush queued frames and the close reply.
const WRITER_DRAIN: Duration = Duration::from_secs(2);

/// Run one session against `endpoint` until the channel closes.
///
/// Local events that arrive before the handshake completes are dispatched
/// too; the bridge drops their sends because the channel is not open yet.
/// The bridge is returned so callers can inspect the final surface.
pub async fn run_session<S: TerminalSurface>(
    surface: S,
    endpoint: &Url,
    mut local: mpsc::UnboundedReceiver<LocalEvent>,
) -> SessionBridge<S, WsChannel> {
    let mut bridge = SessionBridge::new(surface, WsChannel::new());
    let mut local_open = true;

    let connect = open_stream(endpoint);
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => break result.ok(),
            event = local.recv(), if local_open => match event {
                Some(event) => bridge.dispatch(event.into()),
                None => local_open = false,
            },
        }
    };

    let Some(stream) = stream else {
        bridge.channel_mut().close();
        bridge.dispatch(BridgeEvent::Error);
        bridge.dispatch(BridgeEvent::Close);
        return bridge;
    };

    let (mut source, outgoing, writer) = split(stream);
    bridge.channel_mut().open(outgoing);
    bridge.dispatch(BridgeEvent::Open);

    let mut failed = false;
    loop {
        tokio::select! {
            msg = source.next() => match msg {
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    info!("WebSocket closed by server: {:?}", frame);
                    break;
                }
                Some(Ok(msg)) => bridge.dispatch(BridgeEvent::Message(to_inbound(msg))),
                Some(Err(e)) => {
                    debug!("WebSocket error: {}", e);
                    failed = true;
                    break;
                }
                None => break,
            },
            event = local.recv(), if local_open => match event {
                Some(event) => bridge.dispatch(event.into()),
                None => local_open = false,
            },
        }
    }

    bridge.channel_mut().close();
    if failed {
        bridge.dispatch(BridgeEvent::Error);
    }
    bridge.dispatch(BridgeEvent::Close);

    // Closing the channel dropped the queue, so the writer ends on its own.
    if tokio::time::timeout(WRITER_DRAIN, writer).await.is_err() {
        debug!("Writer did not finish flushing in time");
    }
    bridge
}
