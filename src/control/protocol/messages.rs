//! Bridge protocol message types
//!
//! Outbound messages mirror player state into MPRIS property names; inbound
//! messages carry a single transport command from the peer.

use serde::{Deserialize, Serialize};

/// Message sent to the control peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BridgeMessage {
    /// Replace the peer's view of the current player
    UpdateState {
        /// Single-element list holding the new properties
        args: Vec<PlayerStateUpdate>,
    },
    /// A player appeared
    AddPlayer,
    /// No player is available
    RemovePlayer,
    /// The bridge is shutting down
    Quit,
}

/// MPRIS playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Audio is playing
    Playing,
    /// Audio is paused or stopped
    Paused,
}

/// MPRIS player properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerStateUpdate {
    /// `CanGoNext`
    pub can_go_next: bool,
    /// `CanGoPrevious`
    pub can_go_previous: bool,
    /// `PlaybackStatus`
    pub playback_status: PlaybackStatus,
    /// `CanPlay`
    pub can_play: bool,
    /// `CanPause`
    pub can_pause: bool,
    /// `CanSeek`
    pub can_seek: bool,
    /// `Metadata`
    pub metadata: TrackMetadata,
    /// `Position` in microseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// `Volume` in `0.0..=1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// MPRIS track metadata map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track id, present only when a song is known
    #[serde(rename = "mpris:trackid", default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    /// Title
    #[serde(rename = "xesam:title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Artists
    #[serde(rename = "xesam:artist", default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<Vec<String>>,
    /// Album
    #[serde(rename = "xesam:album", default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Cover art url
    #[serde(rename = "mpris:artUrl", default, skip_serializing_if = "Option::is_none")]
    pub art_url: Option<String>,
    /// Length in microseconds
    #[serde(rename = "mpris:length", default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

/// Raw message received from the control peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMessage {
    /// Peer command name
    pub command: String,
}

/// Transport command requested by the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCommand {
    /// `play`
    Play,
    /// `pause`
    Pause,
    /// `playpause`
    PlayPause,
    /// `stop`
    Stop,
    /// `next`
    Next,
    /// `previous`
    Previous,
    /// Anything else; reported and dropped
    Unrecognized(String),
}

impl PeerCommand {
    /// Parse a peer command name
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "playpause" => Self::PlayPause,
            "stop" => Self::Stop,
            "next" => Self::Next,
            "previous" => Self::Previous,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire name of the command
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::PlayPause => "playpause",
            Self::Stop => "stop",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Unrecognized(name) => name,
        }
    }

    /// Agent command this peer command maps to
    ///
    /// The engine cannot force play or pause separately, so all three map to
    /// the toggle.
    #[must_use]
    pub fn routed_command(&self) -> Option<&'static str> {
        use crate::types::command::{PLAY_NEXT, PLAY_PAUSE, PLAY_PREV, STOP};

        match self {
            Self::Play | Self::Pause | Self::PlayPause => Some(PLAY_PAUSE),
            Self::Stop => Some(STOP),
            Self::Next => Some(PLAY_NEXT),
            Self::Previous => Some(PLAY_PREV),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<PeerMessage> for PeerCommand {
    fn from(message: PeerMessage) -> Self {
        Self::parse(&message.command)
    }
}
