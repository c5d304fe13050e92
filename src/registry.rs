//! Agent state registry
//!
//! Maps each agent to its last reported playback state and the monotonic
//! instant of that report. The registry is owned by the engine task, so it
//! takes `&mut self` for writes and needs no locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::time::Instant;

use crate::types::identifiers::AgentId;
use crate::types::state::PlaybackState;

/// Time of an agent's last report
///
/// `Never` orders before every real instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateTime {
    /// No report received
    Never,
    /// Report received at this instant
    At(Instant),
}

impl UpdateTime {
    /// The instant, if any
    #[must_use]
    pub const fn instant(self) -> Option<Instant> {
        match self {
            Self::Never => None,
            Self::At(at) => Some(at),
        }
    }
}

/// One agent's last report
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Agent that reported
    pub agent: AgentId,
    /// Reported state, stored as-is
    pub state: PlaybackState,
    /// Monotonic receipt time, used for selection
    pub timestamp: Instant,
    /// Wall-clock receipt time, used for snapshots
    pub reported_at: DateTime<Utc>,
}

/// Serializable view of a registry entry
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    /// Agent that reported
    pub agent: AgentId,
    /// Reported state
    pub state: PlaybackState,
    /// Wall-clock receipt time
    pub reported_at: DateTime<Utc>,
}

/// Process-wide map from agent to last reported state
#[derive(Debug, Default)]
pub struct AgentRegistry {
    entries: HashMap<AgentId, RegistryEntry>,
}

impl AgentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report stamped with the current time
    ///
    /// Returns the entry it replaced.
    pub fn upsert(&mut self, agent: AgentId, state: PlaybackState) -> Option<RegistryEntry> {
        self.upsert_at(agent, state, Instant::now())
    }

    /// Store a report stamped with `at`
    ///
    /// Timestamps never go backwards for one agent: an earlier `at` is clamped
    /// to the previous report's timestamp.
    pub fn upsert_at(
        &mut self,
        agent: AgentId,
        state: PlaybackState,
        at: Instant,
    ) -> Option<RegistryEntry> {
        let timestamp = match self.entries.get(&agent) {
            Some(prev) if prev.timestamp > at => prev.timestamp,
            _ => at,
        };

        log::trace!("Registry upsert for agent {agent} (playing: {})", state.is_playing);

        let entry = RegistryEntry {
            agent: agent.clone(),
            state,
            timestamp,
            reported_at: Utc::now(),
        };
        self.entries.insert(agent, entry)
    }

    /// Entry for `agent`, if it has reported
    #[must_use]
    pub fn get(&self, agent: &AgentId) -> Option<&RegistryEntry> {
        self.entries.get(agent)
    }

    /// Remove an agent; removing an unknown agent is a no-op
    pub fn remove(&mut self, agent: &AgentId) -> Option<RegistryEntry> {
        let removed = self.entries.remove(agent);
        if removed.is_some() {
            log::debug!("Registry removed agent {agent}");
        }
        removed
    }

    /// Time of the agent's last report
    #[must_use]
    pub fn last_update_time(&self, agent: &AgentId) -> UpdateTime {
        self.entries
            .get(agent)
            .map_or(UpdateTime::Never, |entry| UpdateTime::At(entry.timestamp))
    }

    /// Whether the agent's last report says it is playing
    #[must_use]
    pub fn is_playing(&self, agent: &AgentId) -> bool {
        self.entries
            .get(agent)
            .is_some_and(|entry| entry.state.is_playing)
    }

    /// Number of agents with a report
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no agent has reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries sorted by agent id
    #[must_use]
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        let mut snapshots: Vec<AgentSnapshot> = self
            .entries
            .values()
            .map(|entry| AgentSnapshot {
                agent: entry.agent.clone(),
                state: entry.state.clone(),
                reported_at: entry.reported_at,
            })
            .collect();

        // Sort by agent id
        snapshots.sort_by(|a, b| a.agent.cmp(&b.agent));
        snapshots
    }
}
