// ABOUTME: Wire shapes exchanged between the terminal client and the PTY host
// Binary frames carry raw terminal bytes, text frames carry JSON control messages

use serde::{Deserialize, Serialize};

// ============================================
// Control Messages (text frames)
// ============================================

/// JSON control message carried in a text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Terminal geometry changed, or initial geometry on connect.
    Resize { cols: u16, rows: u16 },
}

impl ControlMessage {
    /// Create a resize message
    pub fn resize(cols: u16, rows: u16) -> Self {
        ControlMessage::Resize { cols, rows }
    }

    /// Parse a text frame, returning `None` for anything that is not a known
    /// control message.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Serialize to the text frame payload.
    ///
    /// The tag comes first, then fields in declaration order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================
// Frames
// ============================================

/// Outbound frame handed to a [`Channel`](super::Channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Binary(Vec<u8>),
    Text(String),
}

impl TryFrom<ControlMessage> for Frame {
    type Error = serde_json::Error;

    fn try_from(msg: ControlMessage) -> Result<Self, Self::Error> {
        msg.to_json().map(Frame::Text)
    }
}

/// Inbound message as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Raw terminal output.
    Binary(Vec<u8>),
    /// Terminal output delivered as text.
    Text(String),
    /// Any other shape the transport surfaced (ping, pong, raw frames).
    Unsupported,
}
