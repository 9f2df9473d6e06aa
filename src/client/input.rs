// ABOUTME: Local event sources for the client: keyboard bytes and viewport resizes
// Stdin is read on a dedicated thread so a pending read never holds the runtime open

use crate::bridge::BridgeEvent;
use std::io::{self, Read};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Events produced on the local side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalEvent {
    /// Characters typed or pasted by the user.
    Input(String),
    /// The controlling terminal changed size.
    Resized,
}

impl From<LocalEvent> for BridgeEvent {
    fn from(event: LocalEvent) -> Self {
        match event {
            LocalEvent::Input(data) => BridgeEvent::Input(data),
            LocalEvent::Resized => BridgeEvent::ViewportResized,
        }
    }
}

/// Incremental UTF-8 decoder for raw keyboard bytes.
///
/// A multi-byte character split across reads is held back until it is
/// complete. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pending: Vec<u8>,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // Incomplete tail, wait for the rest.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

/// Read raw keyboard bytes from stdin and forward them as input events.
pub fn spawn_stdin_reader(events: mpsc::UnboundedSender<LocalEvent>) {
    std::thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut decoder = InputDecoder::new();
        let mut buf = [0u8; 1024];

        loop {
            match stdin.read(&mut buf) {
                Ok(0) => {
                    debug!("Stdin reached EOF");
                    break;
                }
                Ok(n) => {
                    let data = decoder.decode(&buf[..n]);
                    if data.is_empty() {
                        continue;
                    }
                    trace!("Read {} bytes of input", n);
                    if events.send(LocalEvent::Input(data)).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("Stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
}

/// Forward SIGWINCH as resize events.
#[cfg(unix)]
pub fn spawn_resize_listener(
    events: mpsc::UnboundedSender<LocalEvent>,
) -> io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut winch = signal(SignalKind::window_change())?;
    Ok(tokio::spawn(async move {
        while winch.recv().await.is_some() {
            if events.send(LocalEvent::Resized).is_err() {
                break;
            }
        }
    }))
}

/// Resize tracking needs SIGWINCH; elsewhere the geometry stays as first fitted.
#[cfg(not(unix))]
pub fn spawn_resize_listener(
    events: mpsc::UnboundedSender<LocalEvent>,
) -> io::Result<tokio::task::JoinHandle<()>> {
    drop(events);
    Ok(tokio::spawn(async {}))
}
