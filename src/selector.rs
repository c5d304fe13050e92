//! Single agent selection
//!
//! Picks the one agent that represents "the" player when a command or a state
//! mirror must address exactly one. Reports that arrive within the selection
//! window of the newest report are treated as equally current; among those a
//! focused agent wins, then the most recent report, then the lowest agent id.

use std::cmp::Reverse;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{MediaKeysError, Result};
use crate::registry::{AgentRegistry, UpdateTime};
use crate::types::agent::Agent;
use crate::types::identifiers::AgentId;

/// Stateless selector over a registry
#[derive(Debug, Clone, Copy)]
pub struct SingleAgentSelector {
    window: Duration,
}

impl SingleAgentSelector {
    /// Create a selector with the given tolerance window
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Best agent among `candidates`
    ///
    /// # Errors
    /// `NoCandidates` for an empty set, `StaleData` when no candidate has
    /// reported yet. Callers treat both as "no agent".
    pub fn select_best<'a>(
        &self,
        candidates: &'a [Agent],
        registry: &AgentRegistry,
    ) -> Result<&'a Agent> {
        if candidates.is_empty() {
            return Err(MediaKeysError::NoCandidates);
        }

        let newest = candidates
            .iter()
            .filter_map(|agent| registry.last_update_time(&agent.id).instant())
            .max()
            .ok_or(MediaKeysError::StaleData)?;

        candidates
            .iter()
            .filter_map(|agent| {
                let at = registry.last_update_time(&agent.id).instant()?;
                (newest.duration_since(at) < self.window).then_some((agent, at))
            })
            .max_by_key(|(agent, at)| rank(agent, *at))
            .map(|(agent, _)| agent)
            .ok_or(MediaKeysError::StaleData)
    }

    /// Agent whose state should represent the current player
    ///
    /// Playing agents are directly comparable, so when any candidate is
    /// playing the best of them wins without window narrowing. Otherwise this
    /// is [`select_best`](Self::select_best) over every candidate.
    ///
    /// # Errors
    /// Same as [`select_best`](Self::select_best).
    pub fn select_playing<'a>(
        &self,
        candidates: &'a [Agent],
        registry: &AgentRegistry,
    ) -> Result<&'a Agent> {
        let best_playing = candidates
            .iter()
            .filter(|agent| registry.is_playing(&agent.id))
            .filter_map(|agent| {
                registry
                    .last_update_time(&agent.id)
                    .instant()
                    .map(|at| (agent, at))
            })
            .max_by_key(|(agent, at)| rank(agent, *at));

        match best_playing {
            Some((agent, _)) => Ok(agent),
            None => self.select_best(candidates, registry),
        }
    }
}

impl Default for SingleAgentSelector {
    fn default() -> Self {
        Self::new(crate::types::options::DEFAULT_SELECTION_WINDOW)
    }
}

/// Candidates whose last report says they are playing, in candidate order
#[must_use]
pub fn playing<'a>(candidates: &'a [Agent], registry: &AgentRegistry) -> Vec<&'a Agent> {
    candidates
        .iter()
        .filter(|agent| registry.is_playing(&agent.id))
        .collect()
}

// Greater is better: focused, then newer, then lower id
fn rank(agent: &Agent, at: Instant) -> (bool, UpdateTime, Reverse<&AgentId>) {
    (agent.focused, UpdateTime::At(at), Reverse(&agent.id))
}
