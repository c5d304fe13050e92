//! Protocol handler for encoding bridge messages

use crate::error::{MediaKeysError, Result};
use crate::types::identifiers::AgentId;
use crate::types::state::{PlaybackCapabilities, PlaybackState, trimmed};

use super::messages::{
    BridgeMessage, PeerCommand, PeerMessage, PlaybackStatus, PlayerStateUpdate, TrackMetadata,
};

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Stateless encoder/decoder for the bridge protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolHandler;

impl ProtocolHandler {
    /// Create a new protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the `update_state` message for the selected agent
    ///
    /// Fields the agent did not report are omitted; missing times count as 0
    /// and unparsable times are dropped.
    #[must_use]
    pub fn create_update_state(&self, agent: &AgentId, state: &PlaybackState) -> BridgeMessage {
        let song = trimmed(state.song.as_deref());
        let caps = state.capabilities;

        let metadata = TrackMetadata {
            track_id: song.map(|_| agent.to_string()),
            title: state.song.clone(),
            artist: trimmed(state.artist.as_deref()).map(|a| vec![a.to_string()]),
            album: state.album.clone(),
            art_url: state.art_url.clone(),
            length: state.length_seconds().and_then(to_micros),
        };

        let update = PlayerStateUpdate {
            can_go_next: caps.contains(PlaybackCapabilities::NEXT),
            can_go_previous: caps.contains(PlaybackCapabilities::PREVIOUS),
            playback_status: if state.is_playing {
                PlaybackStatus::Playing
            } else {
                PlaybackStatus::Paused
            },
            can_play: caps.contains(PlaybackCapabilities::PLAY_PAUSE),
            can_pause: caps.contains(PlaybackCapabilities::PLAY_PAUSE),
            can_seek: caps.contains(PlaybackCapabilities::SEEK),
            metadata,
            position: state.position_seconds().and_then(to_micros),
            volume: state.volume,
        };

        BridgeMessage::UpdateState { args: vec![update] }
    }

    /// Serialize a bridge message to JSON
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    pub fn serialize_message(&self, message: &BridgeMessage) -> Result<String> {
        serde_json::to_string(message)
            .map_err(|e| MediaKeysError::json_encode(format!("Failed to serialize message: {e}")))
    }

    /// Decode a peer message
    ///
    /// # Errors
    /// Returns error if the value has no string `command` field
    pub fn parse_peer_message(&self, value: serde_json::Value) -> Result<PeerCommand> {
        serde_json::from_value::<PeerMessage>(value)
            .map(PeerCommand::from)
            .map_err(|e| MediaKeysError::protocol(format!("Malformed peer message: {e}")))
    }
}

fn to_micros(seconds: u64) -> Option<u64> {
    seconds.checked_mul(MICROS_PER_SECOND)
}
