//! Bridge protocol for the external control peer
//!
//! The peer is an MPRIS native messaging host. Each frame carries one JSON
//! object with a `command` field.
//!
//! # Example: Building a state update
//!
//! ```rust
//! use kodegen_media_keys::control::protocol::{BridgeMessage, ProtocolHandler};
//! use kodegen_media_keys::types::{AgentId, PlaybackState};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = ProtocolHandler::new();
//! let state = PlaybackState::track("Song", true);
//! let message = handler.create_update_state(&AgentId::from("12"), &state);
//!
//! let json = handler.serialize_message(&message)?;
//! assert!(json.starts_with(r#"{"command":"update_state""#));
//!
//! let quit = handler.serialize_message(&BridgeMessage::Quit)?;
//! assert_eq!(quit, r#"{"command":"quit"}"#);
//! # Ok(())
//! # }
//! ```

mod handler;
mod messages;

// Re-export public types
pub use handler::ProtocolHandler;
pub use messages::{
    BridgeMessage, PeerCommand, PeerMessage, PlaybackStatus, PlayerStateUpdate, TrackMetadata,
};
