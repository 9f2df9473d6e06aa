// ABOUTME: Session bridge owning one terminal surface and one channel
// Relays input and output between them and reports geometry changes to the host

use super::channel::Channel;
use super::protocol::{ControlMessage, Frame, InboundMessage};
use super::surface::TerminalSurface;
use tracing::trace;

/// Red inline notice rendered when the channel reports an error.
pub const ERROR_NOTICE: &str = "\r\n\x1b[31mWebSocket error\x1b[0m\r\n";

/// Yellow inline notice rendered when the channel closes.
pub const CLOSE_NOTICE: &str = "\r\n\x1b[33mDisconnected\x1b[0m\r\n";

/// Events the bridge reacts to, one handler per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Channel finished its handshake.
    Open,
    /// Channel delivered a message.
    Message(InboundMessage),
    /// User typed or pasted on the surface.
    Input(String),
    /// Viewport changed size.
    ViewportResized,
    /// Channel failed.
    Error,
    /// Channel closed.
    Close,
}

/// Owns the terminal surface and the channel for the lifetime of a session.
pub struct SessionBridge<S, C> {
    surface: S,
    channel: C,
}

impl<S: TerminalSurface, C: Channel> SessionBridge<S, C> {
    pub fn new(surface: S, channel: C) -> Self {
        Self { surface, channel }
    }

    /// Route an event to its handler.
    pub fn dispatch(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Open => self.on_open(),
            BridgeEvent::Message(msg) => self.on_message(msg),
            BridgeEvent::Input(data) => self.on_input(&data),
            BridgeEvent::ViewportResized => self.on_viewport_resize(),
            BridgeEvent::Error => self.on_error(),
            BridgeEvent::Close => self.on_close(),
        }
    }

    /// Tell the host the initial geometry. Runs before any other traffic.
    pub fn on_open(&mut self) {
        self.send_resize();
    }

    pub fn on_message(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Binary(bytes) => self.surface.write(&bytes),
            InboundMessage::Text(text) => self.surface.write_str(&text),
            InboundMessage::Unsupported => trace!("Ignoring unsupported inbound message"),
        }
    }

    /// Forward user input as a binary frame.
    pub fn on_input(&mut self, data: &str) {
        self.send(Frame::Binary(data.as_bytes().to_vec()));
    }

    pub fn on_viewport_resize(&mut self) {
        // Geometry must be current before the notice reads it.
        let geometry = self.surface.fit();
        trace!("Surface fitted to {}x{}", geometry.cols, geometry.rows);
        self.send_resize();
    }

    /// Send the current geometry as a resize control message.
    pub fn send_resize(&mut self) {
        let geometry = self.surface.geometry();
        match Frame::try_from(ControlMessage::resize(geometry.cols, geometry.rows)) {
            Ok(frame) => self.send(frame),
            Err(e) => trace!("Could not encode resize: {}", e),
        }
    }

    pub fn on_error(&mut self) {
        self.surface.write_str(ERROR_NOTICE);
    }

    pub fn on_close(&mut self) {
        self.surface.write_str(CLOSE_NOTICE);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    fn send(&mut self, frame: Frame) {
        let state = self.channel.ready_state();
        if !state.is_open() {
            trace!("Dropping outbound frame while channel is {}", state);
            return;
        }
        self.channel.send(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::channel::{MockChannel, ReadyState};
    use crate::bridge::surface::{Geometry, MockTerminalSurface};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn surface_at(cols: u16, rows: u16) -> MockTerminalSurface {
        let mut surface = MockTerminalSurface::new();
        surface
            .expect_geometry()
            .return_const(Geometry::new(cols, rows));
        surface
    }

    fn channel_in(state: ReadyState) -> MockChannel {
        let mut channel = MockChannel::new();
        channel.expect_ready_state().return_const(state);
        channel
    }

    #[test]
    fn test_open_sends_single_resize() {
        let mut channel = channel_in(ReadyState::Open);
        channel
            .expect_send()
            .with(eq(Frame::Text(
                r#"{"type":"resize","cols":80,"rows":24}"#.to_string(),
            )))
            .times(1)
            .return_const(());

        let mut bridge = SessionBridge::new(surface_at(80, 24), channel);
        bridge.dispatch(BridgeEvent::Open);
    }

    #[test]
    fn test_sends_dropped_unless_open() {
        for state in [ReadyState::Connecting, ReadyState::Closing, ReadyState::Closed] {
            let mut channel = channel_in(state);
            channel.expect_send().never();

            let mut surface = surface_at(80, 24);
            surface.expect_fit().return_const(Geometry::new(90, 30));

            let mut bridge = SessionBridge::new(surface, channel);
            bridge.dispatch(BridgeEvent::Input("ls\r".to_string()));
            bridge.dispatch(BridgeEvent::ViewportResized);
            bridge.send_resize();
        }
    }

    #[test]
    fn test_input_is_sent_as_utf8_binary() {
        let mut channel = channel_in(ReadyState::Open);
        channel
            .expect_send()
            .with(eq(Frame::Binary("héllo\r".as_bytes().to_vec())))
            .times(1)
            .return_const(());

        let mut bridge = SessionBridge::new(MockTerminalSurface::new(), channel);
        bridge.dispatch(BridgeEvent::Input("héllo\r".to_string()));
    }

    #[test]
    fn test_resize_fits_before_notice() {
        let mut seq = Sequence::new();
        let mut surface = MockTerminalSurface::new();
        surface
            .expect_fit()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Geometry::new(100, 30));
        surface
            .expect_geometry()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Geometry::new(100, 30));

        let mut channel = channel_in(ReadyState::Open);
        channel
            .expect_send()
            .with(eq(Frame::Text(
                r#"{"type":"resize","cols":100,"rows":30}"#.to_string(),
            )))
            .times(1)
            .return_const(());

        let mut bridge = SessionBridge::new(surface, channel);
        bridge.dispatch(BridgeEvent::ViewportResized);
    }

    #[test]
    fn test_inbound_payloads_reach_surface() {
        let mut surface = MockTerminalSurface::new();
        surface
            .expect_write()
            .withf(|bytes| bytes == b"\x1b[2Jboard")
            .times(1)
            .return_const(());
        surface
            .expect_write_str()
            .withf(|text| text == "plain text")
            .times(1)
            .return_const(());

        let mut channel = MockChannel::new();
        channel.expect_send().never();

        let mut bridge = SessionBridge::new(surface, channel);
        bridge.dispatch(BridgeEvent::Message(InboundMessage::Binary(
            b"\x1b[2Jboard".to_vec(),
        )));
        bridge.dispatch(BridgeEvent::Message(InboundMessage::Text(
            "plain text".to_string(),
        )));
        bridge.dispatch(BridgeEvent::Message(InboundMessage::Unsupported));
    }

    #[test]
    fn test_lifecycle_notices() {
        let mut surface = MockTerminalSurface::new();
        surface
            .expect_write_str()
            .withf(|text| text == ERROR_NOTICE)
            .times(1)
            .return_const(());
        surface
            .expect_write_str()
            .withf(|text| text == CLOSE_NOTICE)
            .times(1)
            .return_const(());

        let mut bridge = SessionBridge::new(surface, MockChannel::new());
        bridge.dispatch(BridgeEvent::Error);
        bridge.dispatch(BridgeEvent::Close);
    }
}
