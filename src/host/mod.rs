//! Collaborator interfaces supplied by the embedding host
//!
//! The engine never talks to players, settings or a notification surface
//! directly. It asks an [`AgentDirectory`] which agents exist, sends commands
//! through an [`AgentDispatcher`] and shows notifications through a
//! [`NotificationPresenter`].

mod directory;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::agent::Agent;
use crate::types::command::AgentMessage;
use crate::types::identifiers::{AgentId, NotificationKey};
use crate::types::notification::Notification;

pub use directory::InMemoryDirectory;

/// Enumerates agents and answers per-agent capability queries
pub trait AgentDirectory: Send + Sync {
    /// Agents currently eligible for commands, in a stable order
    ///
    /// # Errors
    /// Returns error if the agent list cannot be obtained
    fn active_agents(&self) -> BoxFuture<'_, Result<Vec<Agent>>>;

    /// Whether the agent is driven by the secondary key set
    fn supports_secondary_control(&self, agent: &AgentId) -> bool;

    /// Whether track-change notifications are enabled for the agent
    fn notifications_enabled(&self, agent: &AgentId) -> bool;
}

/// Delivers commands to individual agents
pub trait AgentDispatcher: Send + Sync {
    /// Send one message to one agent, fire-and-forget
    ///
    /// # Errors
    /// Returns error if the agent is unreachable
    fn dispatch(&self, agent: &AgentId, message: &AgentMessage) -> Result<()>;
}

/// Presents and clears user-visible notifications
pub trait NotificationPresenter: Send + Sync {
    /// Show or replace the notification for `key`
    ///
    /// # Errors
    /// Returns error if the notification cannot be shown
    fn notify(&self, key: &NotificationKey, notification: &Notification) -> Result<()>;

    /// Remove the notification for `key`
    ///
    /// # Errors
    /// Returns error if the notification cannot be cleared
    fn clear(&self, key: &NotificationKey) -> Result<()>;
}
