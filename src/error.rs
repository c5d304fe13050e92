//! Error types for the media-key engine

use thiserror::Error;

use crate::types::identifiers::AgentId;

/// Main error type for the media-key engine
#[derive(Error, Debug)]
pub enum MediaKeysError {
    /// No agent could be selected because the candidate set was empty
    #[error("No candidate agents")]
    NoCandidates,

    /// Every candidate is missing a state report, so none is current
    #[error("No candidate agent has reported playback state")]
    StaleData,

    /// Delivering a command to a single agent failed
    #[error("Dispatch to agent {agent} failed: {message}")]
    Dispatch {
        /// Agent the command was addressed to
        agent: AgentId,
        /// Failure description from the dispatcher
        message: String,
    },

    /// The external control bridge could not be opened
    #[error("External control bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// Native messaging host executable not found
    #[error("Native messaging host not found: {0}")]
    HostNotFound(String),

    /// Connection error when talking to the native host
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bridge protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Notification presenter error
    #[error("Notification error: {0}")]
    Notification(String),

    /// JSON encode/decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for media-key operations
pub type Result<T> = std::result::Result<T, MediaKeysError>;

impl MediaKeysError {
    /// Create a dispatch error for one agent
    pub fn dispatch(agent: AgentId, msg: impl Into<String>) -> Self {
        Self::Dispatch {
            agent,
            message: msg.into(),
        }
    }

    /// Create a bridge unavailable error
    pub fn bridge_unavailable(msg: impl Into<String>) -> Self {
        Self::BridgeUnavailable(msg.into())
    }

    /// Create a host not found error
    pub fn host_not_found(msg: impl Into<String>) -> Self {
        Self::HostNotFound(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a JSON encode error
    pub fn json_encode(msg: impl Into<String>) -> Self {
        Self::JsonDecode(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            msg.into(),
        )))
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for the selection errors that mean "no agent" rather than a fault
    #[must_use]
    pub const fn is_no_selection(&self) -> bool {
        matches!(self, Self::NoCandidates | Self::StaleData)
    }
}
