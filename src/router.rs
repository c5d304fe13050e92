//! Command routing
//!
//! Decides which agents receive a command and dispatches it to each of them.
//! A failure to reach one agent is logged and recorded in the [`RouteReport`];
//! the remaining agents still receive the command.

use std::sync::Arc;

use crate::host::{AgentDirectory, AgentDispatcher};
use crate::registry::AgentRegistry;
use crate::selector::{SingleAgentSelector, playing};
use crate::types::agent::Agent;
use crate::types::command::{AgentCommand, CommandClass};
use crate::types::identifiers::AgentId;

/// Outcome of routing one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReport {
    /// Agents the command was delivered to, in dispatch order
    pub delivered: Vec<AgentId>,
    /// Agents that could not be reached, with the reason
    pub failed: Vec<(AgentId, String)>,
}

impl RouteReport {
    /// True if nothing was attempted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }

    /// Every agent a dispatch was attempted for
    #[must_use]
    pub fn attempted(&self) -> Vec<AgentId> {
        self.delivered
            .iter()
            .chain(self.failed.iter().map(|(agent, _)| agent))
            .cloned()
            .collect()
    }
}

/// Routes commands to agents
pub struct CommandRouter {
    dispatcher: Arc<dyn AgentDispatcher>,
    selector: SingleAgentSelector,
    single_agent_mode: bool,
}

impl CommandRouter {
    /// Create a router
    pub fn new(
        dispatcher: Arc<dyn AgentDispatcher>,
        selector: SingleAgentSelector,
        single_agent_mode: bool,
    ) -> Self {
        Self {
            dispatcher,
            selector,
            single_agent_mode,
        }
    }

    /// Whether single-agent routing is on
    #[must_use]
    pub const fn single_agent_mode(&self) -> bool {
        self.single_agent_mode
    }

    /// Turn single-agent routing on or off
    pub fn set_single_agent_mode(&mut self, enabled: bool) {
        if self.single_agent_mode != enabled {
            log::info!("Single agent mode {}", if enabled { "enabled" } else { "disabled" });
        }
        self.single_agent_mode = enabled;
    }

    /// Route `command` among `candidates`
    ///
    /// An explicit target bypasses every rule. Broadcast-class commands and
    /// all commands outside single-agent mode go to every candidate. In
    /// single-agent mode the candidates are narrowed to the primary or
    /// secondary partition, then to the playing agents, then to the selector's
    /// best agent.
    pub fn route(
        &self,
        command: &AgentCommand,
        candidates: &[Agent],
        registry: &AgentRegistry,
        directory: &dyn AgentDirectory,
    ) -> RouteReport {
        if let Some(target) = &command.target {
            log::debug!("Single agent request: {} -> {target}", command.name);
            return self.dispatch_all(command, std::iter::once(target));
        }

        if command.class() == CommandClass::Broadcast || !self.single_agent_mode {
            return self.dispatch_all(command, candidates.iter().map(|a| &a.id));
        }

        self.route_single(command, candidates, registry, directory)
    }

    fn route_single(
        &self,
        command: &AgentCommand,
        candidates: &[Agent],
        registry: &AgentRegistry,
        directory: &dyn AgentDirectory,
    ) -> RouteReport {
        if candidates.is_empty() {
            return RouteReport::default();
        }

        let secondary = command.is_secondary();
        let restricted: Vec<Agent> = candidates
            .iter()
            .filter(|agent| directory.supports_secondary_control(&agent.id) == secondary)
            .cloned()
            .collect();

        let playing_agents = playing(&restricted, registry);
        if !playing_agents.is_empty() {
            return self.dispatch_all(command, playing_agents.into_iter().map(|a| &a.id));
        }

        match self.selector.select_best(&restricted, registry) {
            Ok(best) => self.dispatch_all(command, std::iter::once(&best.id)),
            Err(e) => {
                log::debug!("No agent selected for {}: {e}", command.name);
                RouteReport::default()
            }
        }
    }

    fn dispatch_all<'a>(
        &self,
        command: &AgentCommand,
        targets: impl IntoIterator<Item = &'a AgentId>,
    ) -> RouteReport {
        let message = command.to_message();
        let mut report = RouteReport::default();

        for agent in targets {
            match self.dispatcher.dispatch(agent, &message) {
                Ok(()) => {
                    log::debug!("Sent: {} To: {agent}", command.name);
                    report.delivered.push(agent.clone());
                }
                Err(e) => {
                    log::warn!("Failed to send {} to {agent}: {e}", command.name);
                    report.failed.push((agent.clone(), e.to_string()));
                }
            }
        }

        report
    }
}
