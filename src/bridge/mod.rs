// ABOUTME: Session bridge relaying a terminal surface over a bidirectional channel
// Platform-agnostic core shared by the native client and its tests

pub mod channel;
pub mod endpoint;
pub mod protocol;
pub mod session;
pub mod surface;

pub use channel::{Channel, ReadyState};
pub use endpoint::{endpoint_for, EndpointError};
pub use protocol::{ControlMessage, Frame, InboundMessage};
pub use session::{BridgeEvent, SessionBridge, CLOSE_NOTICE, ERROR_NOTICE};
pub use surface::{Geometry, TerminalSurface};
