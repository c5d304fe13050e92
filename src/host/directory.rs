//! In-memory agent directory
//!
//! Used by the stdio host binary, where the embedding process pushes the
//! agent list, and by tests.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use super::AgentDirectory;
use crate::error::Result;
use crate::types::agent::Agent;
use crate::types::identifiers::AgentId;

#[derive(Debug, Default)]
struct DirectoryState {
    agents: Vec<Agent>,
    secondary: HashSet<AgentId>,
    muted_notifications: HashSet<AgentId>,
}

/// Shared, clonable directory backed by a lock
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `agents`
    #[must_use]
    pub fn with_agents(agents: Vec<Agent>) -> Self {
        let directory = Self::new();
        directory.set_agents(agents);
        directory
    }

    /// Replace the agent list
    pub fn set_agents(&self, agents: Vec<Agent>) {
        self.state.write().agents = agents;
    }

    /// Add an agent, replacing one with the same id
    pub fn upsert_agent(&self, agent: Agent) {
        let mut state = self.state.write();
        match state.agents.iter_mut().find(|a| a.id == agent.id) {
            Some(existing) => *existing = agent,
            None => state.agents.push(agent),
        }
    }

    /// Remove an agent
    pub fn remove_agent(&self, agent: &AgentId) {
        let mut state = self.state.write();
        state.agents.retain(|a| &a.id != agent);
        state.secondary.remove(agent);
        state.muted_notifications.remove(agent);
    }

    /// Give focus to `agent`, taking it from every other agent
    ///
    /// Returns false if the agent is unknown.
    pub fn set_focus(&self, agent: &AgentId) -> bool {
        let mut state = self.state.write();
        let known = state.agents.iter().any(|a| &a.id == agent);
        if known {
            for a in &mut state.agents {
                a.focused = &a.id == agent;
            }
        }
        known
    }

    /// Mark an agent as secondary-controlled or not
    pub fn set_secondary(&self, agent: &AgentId, secondary: bool) {
        let mut state = self.state.write();
        if secondary {
            state.secondary.insert(agent.clone());
        } else {
            state.secondary.remove(agent);
        }
    }

    /// Enable or disable notifications for an agent
    pub fn set_notifications(&self, agent: &AgentId, enabled: bool) {
        let mut state = self.state.write();
        if enabled {
            state.muted_notifications.remove(agent);
        } else {
            state.muted_notifications.insert(agent.clone());
        }
    }

    /// Copy of the current agent list
    #[must_use]
    pub fn agents(&self) -> Vec<Agent> {
        self.state.read().agents.clone()
    }
}

impl AgentDirectory for InMemoryDirectory {
    fn active_agents(&self) -> BoxFuture<'_, Result<Vec<Agent>>> {
        let agents = self.agents();
        async move { Ok(agents) }.boxed()
    }

    fn supports_secondary_control(&self, agent: &AgentId) -> bool {
        self.state.read().secondary.contains(agent)
    }

    fn notifications_enabled(&self, agent: &AgentId) -> bool {
        !self.state.read().muted_notifications.contains(agent)
    }
}
