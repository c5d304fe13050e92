//! Events consumed by the engine

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::control::PeerCommand;
use crate::error::{MediaKeysError, Result};
use crate::types::command::AgentCommand;
use crate::types::identifiers::AgentId;
use crate::types::options::Settings;
use crate::types::state::PlaybackState;

/// Everything that can happen to the engine
///
/// Timer expiries are not events; the run loop waits on them directly.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// An agent reported its playback state
    ReportState {
        /// Reporting agent
        agent: AgentId,
        /// Reported state, stored as-is
        state: PlaybackState,
    },
    /// An agent went away
    AgentRemoved {
        /// Removed agent
        agent: AgentId,
    },
    /// Focus moved to an agent
    FocusChanged {
        /// Newly focused agent
        agent: AgentId,
    },
    /// A new agent started playing media
    AgentAttached {
        /// Attached agent
        agent: AgentId,
    },
    /// A hotkey fired
    RawInput {
        /// Command name bound to the key
        name: String,
        /// When the key event arrived; press gaps are measured between these
        at: Instant,
    },
    /// A command issued by the host, possibly targeted
    Command(AgentCommand),
    /// A command from the external control peer
    PeerCommand(PeerCommand),
    /// The settings store changed
    SettingsChanged(Settings),
    /// The control peer's message stream ended
    ///
    /// Sent by the bridge itself; `generation` identifies the connection
    /// that ended so a late report about an older one is ignored.
    PeerDisconnected {
        /// Connection generation from the bridge
        generation: u64,
    },
    /// Stop the engine
    Shutdown,
}

impl InboundEvent {
    /// A hotkey event stamped with the current time
    pub fn raw_input(name: impl Into<String>) -> Self {
        Self::RawInput {
            name: name.into(),
            at: Instant::now(),
        }
    }
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was processed
    Handled,
    /// The event was reported and dropped
    Unhandled(String),
}

impl EventOutcome {
    /// True if the event was processed
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// Cloneable sender feeding a running engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<InboundEvent>,
}

impl EngineHandle {
    pub(super) const fn new(tx: mpsc::UnboundedSender<InboundEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event
    ///
    /// # Errors
    /// Returns error if the engine has stopped
    pub fn send(&self, event: InboundEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| MediaKeysError::connection("Engine is not running"))
    }

    /// Queue a hotkey event stamped with the time of this call
    ///
    /// # Errors
    /// Returns error if the engine has stopped
    pub fn raw_input(&self, name: impl Into<String>) -> Result<()> {
        self.send(InboundEvent::raw_input(name))
    }

    /// Ask the engine to stop
    ///
    /// # Errors
    /// Returns error if the engine has already stopped
    pub fn shutdown(&self) -> Result<()> {
        self.send(InboundEvent::Shutdown)
    }

    /// Whether the engine has stopped receiving
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
