//! Commands routed to agents and the message agents receive

use serde::{Deserialize, Serialize};

use super::identifiers::AgentId;

/// Toggle play/pause
pub const PLAY_PAUSE: &str = "playPause";
/// Skip to next track
pub const PLAY_NEXT: &str = "playNext";
/// Go to previous track
pub const PLAY_PREV: &str = "playPrev";
/// Stop playback
pub const STOP: &str = "stop";
/// Mute/unmute
pub const MUTE: &str = "mute";
/// Ask agents to push their state
pub const PLAYER_STATE_NOTIFY: &str = "playerStateNotify";
/// Query agent state
pub const GET_PLAYER_STATE: &str = "getPlayerState";
/// Change playback rate; used for press-and-hold fast forward
pub const PLAYBACK_RATE: &str = "playBackRate";

/// Names that always reach every candidate regardless of routing mode
pub const BROADCAST_COMMANDS: &[&str] = &[MUTE, STOP, PLAYER_STATE_NOTIFY, GET_PLAYER_STATE];

/// Suffix marking commands for secondary-controlled agents
const SECONDARY_SUFFIX: &str = "secondary";

/// Routing class of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Sent to every candidate
    Broadcast,
    /// Subject to single-agent routing
    Routable,
}

/// A user or API issued command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCommand {
    /// Command name, e.g. `playPause`
    pub name: String,
    /// Opaque arguments forwarded to the agent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
    /// Explicit single target; bypasses routing when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
}

impl AgentCommand {
    /// Create an untargeted command without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            target: None,
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Pin the command to one agent
    #[must_use]
    pub fn targeted(mut self, agent: impl Into<AgentId>) -> Self {
        self.target = Some(agent.into());
        self
    }

    /// Routing class of this command
    #[must_use]
    pub fn class(&self) -> CommandClass {
        if BROADCAST_COMMANDS.contains(&self.name.as_str()) {
            CommandClass::Broadcast
        } else {
            CommandClass::Routable
        }
    }

    /// Whether the command addresses secondary-controlled agents
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        self.name.to_lowercase().ends_with(SECONDARY_SUFFIX)
    }

    /// Wire message for an agent
    #[must_use]
    pub fn to_message(&self) -> AgentMessage {
        AgentMessage {
            action: self.name.clone(),
            args: (!self.args.is_empty()).then(|| self.args.clone()),
        }
    }
}

/// Payload delivered to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Command name
    pub action: String,
    /// Arguments, omitted when there are none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_names_are_classified() {
        for name in BROADCAST_COMMANDS {
            assert_eq!(AgentCommand::new(*name).class(), CommandClass::Broadcast);
        }
        assert_eq!(AgentCommand::new(PLAY_NEXT).class(), CommandClass::Routable);
    }

    #[test]
    fn secondary_suffix_is_case_insensitive() {
        assert!(AgentCommand::new("playPauseSecondary").is_secondary());
        assert!(AgentCommand::new("playNext_secondary").is_secondary());
        assert!(!AgentCommand::new(PLAY_PAUSE).is_secondary());
    }

    #[test]
    fn message_omits_empty_args() {
        let bare = serde_json::to_value(AgentCommand::new(STOP).to_message()).unwrap();
        assert_eq!(bare, serde_json::json!({"action": "stop"}));

        let rate = AgentCommand::new(PLAYBACK_RATE).arg(2).to_message();
        assert_eq!(
            serde_json::to_value(rate).unwrap(),
            serde_json::json!({"action": "playBackRate", "args": [2]})
        );
    }
}
