//! External control surface
//!
//! The [`protocol`] module encodes the messages exchanged with the MPRIS
//! native messaging host; [`ExternalControlBridge`] owns the connection.

mod bridge;
pub mod protocol;

pub use bridge::{ExternalControlBridge, TransportFactory};
pub use protocol::{BridgeMessage, PeerCommand, ProtocolHandler};
