// ABOUTME: WebSocket channel used by the native client bridge
// Handshake, outbound writer task and frame conversion for tokio-tungstenite

use crate::bridge::{Channel, Frame, InboundMessage, ReadyState};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace};
use url::Url;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, tungstenite::Message>;

/// Channel whose sends are queued to a writer task owning the socket sink.
///
/// Starts out `Connecting` with nowhere to send. The client runner moves it
/// to `Open` once the handshake succeeds and to `Closed` when the socket ends.
#[derive(Debug)]
pub struct WsChannel {
    state: ReadyState,
    outgoing: Option<mpsc::UnboundedSender<tungstenite::Message>>,
}

impl WsChannel {
    pub fn new() -> Self {
        Self {
            state: ReadyState::Connecting,
            outgoing: None,
        }
    }

    /// Attach the queue feeding the writer task.
    pub fn open(&mut self, outgoing: mpsc::UnboundedSender<tungstenite::Message>) {
        self.outgoing = Some(outgoing);
        self.state = ReadyState::Open;
    }

    /// Stop accepting sends. Dropping the queue lets the writer task finish.
    pub fn close(&mut self) {
        self.outgoing = None;
        self.state = ReadyState::Closed;
    }
}

impl Default for WsChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for WsChannel {
    fn ready_state(&self) -> ReadyState {
        self.state
    }

    fn send(&mut self, frame: Frame) {
        let Some(outgoing) = &self.outgoing else {
            return;
        };
        let message = match frame {
            Frame::Binary(bytes) => tungstenite::Message::Binary(bytes),
            Frame::Text(text) => tungstenite::Message::Text(text),
        };
        if outgoing.send(message).is_err() {
            trace!("Writer task gone, dropping frame");
        }
    }
}

/// Make sure `wss` handshakes have a TLS crypto backend to build on.
fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Perform the WebSocket handshake.
pub async fn open_stream(url: &Url) -> Result<WsStream, tungstenite::Error> {
    info!("Connecting to {}", url);
    if url.scheme() == "wss" {
        install_crypto_provider();
    }

    match connect_async(url.as_str()).await {
        Ok((stream, response)) => {
            info!("WebSocket connected to {}", url);
            debug!("WebSocket response status: {:?}", response.status());
            Ok(stream)
        }
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            let text = e.to_string();
            if matches!(
                e,
                tungstenite::Error::Url(tungstenite::error::UrlError::TlsFeatureNotEnabled)
            ) {
                error!("This build cannot open secure (wss) sessions");
            } else if text.contains("refused") {
                error!("Connection refused - is the session host running?");
            } else if text.contains("lookup") {
                error!("DNS/hostname lookup failed - check the URL: {}", url);
            }
            Err(e)
        }
    }
}

/// Drain queued frames into the socket until the queue closes or a write fails.
pub async fn write_frames(
    mut sink: WsSink,
    mut outgoing: mpsc::UnboundedReceiver<tungstenite::Message>,
) {
    while let Some(msg) = outgoing.recv().await {
        if let Err(e) = sink.send(msg).await {
            debug!("Failed to send WebSocket message: {}", e);
            return;
        }
    }
    let _ = sink.close().await;
}

/// Map a transport message to what the bridge understands.
pub fn to_inbound(msg: tungstenite::Message) -> InboundMessage {
    match msg {
        tungstenite::Message::Binary(bytes) => InboundMessage::Binary(bytes),
        tungstenite::Message::Text(text) => InboundMessage::Text(text),
        _ => InboundMessage::Unsupported,
    }
}

/// Split a connected stream into its reader half and a spawned writer task.
pub fn split(
    stream: WsStream,
) -> (
    futures_util::stream::SplitStream<WsStream>,
    mpsc::UnboundedSender<tungstenite::Message>,
    tokio::task::JoinHandle<()>,
) {
    let (sink, source) = stream.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, rx));
    (source, tx, writer)
}
