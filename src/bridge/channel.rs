// ABOUTME: Channel abstraction for the transport side of the session bridge
// Mirrors the WebSocket ready states; sends are fire-and-forget

use super::protocol::Frame;
use std::fmt;

/// Connection state of a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ReadyState {
    pub fn is_open(self) -> bool {
        self == ReadyState::Open
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Bidirectional, frame-oriented connection owned by the bridge.
///
/// Implementations hand frames to their transport without waiting for
/// delivery. The bridge checks [`Channel::ready_state`] before every send.
#[cfg_attr(test, mockall::automock)]
pub trait Channel {
    fn ready_state(&self) -> ReadyState;

    fn send(&mut self, frame: Frame);
}
