//! `Engine` construction and event handling

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::control::{ExternalControlBridge, PeerCommand, TransportFactory};
use crate::long_press::{LongPressDetector, PressOutcome};
use crate::notify::NotificationDebouncer;
use crate::registry::AgentRegistry;
use crate::router::{CommandRouter, RouteReport};
use crate::selector::SingleAgentSelector;
use crate::transport::{NativeHostTransport, Transport};
use crate::types::agent::Agent;
use crate::types::command::AgentCommand;
use crate::types::identifiers::{AgentId, NotificationKey};
use crate::types::notification::Notification;
use crate::types::options::{EngineOptions, Settings};
use crate::types::state::PlaybackState;

use super::{Collaborators, Engine, EngineHandle, EventOutcome, InboundEvent};

impl Engine<NativeHostTransport> {
    /// Create an engine whose bridge spawns the native messaging host
    ///
    /// The host is located when the bridge first opens, using
    /// `options.host_path` if set.
    #[must_use]
    pub fn with_native_host(
        options: EngineOptions,
        collaborators: Collaborators,
    ) -> (Self, EngineHandle) {
        let host_path = options.host_path.clone();
        let max_frame_size = options.max_frame_size;
        let connector: TransportFactory<NativeHostTransport> =
            Arc::new(move || NativeHostTransport::new(host_path.clone(), max_frame_size));

        Self::new(options, collaborators, connector)
    }
}

impl<T: Transport> Engine<T> {
    /// Create an engine and the handle that feeds it
    ///
    /// The bridge stays closed until [`start`](Self::start) or a settings
    /// change asks for it.
    #[must_use]
    pub fn new(
        options: EngineOptions,
        collaborators: Collaborators,
        connector: TransportFactory<T>,
    ) -> (Self, EngineHandle) {
        let (tx, events) = mpsc::unbounded_channel();

        let selector = SingleAgentSelector::new(options.selection_window);
        let router = CommandRouter::new(
            collaborators.dispatcher,
            selector,
            options.single_agent_mode,
        );
        let detector = LongPressDetector::from_options(&options);
        let debouncer =
            NotificationDebouncer::new(collaborators.presenter, options.notification_ttl);
        let bridge = ExternalControlBridge::new(connector, &tx);

        let handle = EngineHandle::new(tx);
        let engine = Self {
            options,
            registry: AgentRegistry::new(),
            selector,
            router,
            detector,
            debouncer,
            bridge,
            bridge_held: false,
            directory: collaborators.directory,
            events,
        };

        (engine, handle)
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Agent state registry
    #[must_use]
    pub const fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Control bridge
    #[must_use]
    pub const fn bridge(&self) -> &ExternalControlBridge<T> {
        &self.bridge
    }

    /// Pending notification timers
    #[must_use]
    pub const fn notifications(&self) -> &NotificationDebouncer {
        &self.debouncer
    }

    /// Apply startup options
    ///
    /// Opens the bridge if `use_bridge` is set. A bridge that cannot be
    /// opened is logged and left closed.
    pub async fn start(&mut self) {
        if self.options.use_bridge && !self.bridge_held {
            if let Err(e) = self.hold_bridge().await {
                log::warn!("MPRIS bridge not started: {e}");
            }
        }
    }

    /// Handle one event to completion
    pub async fn handle(&mut self, event: InboundEvent) -> EventOutcome {
        match event {
            InboundEvent::ReportState { agent, state } => {
                self.report_state(agent, state).await;
                EventOutcome::Handled
            }
            InboundEvent::AgentRemoved { agent } => {
                if self.registry.remove(&agent).is_some() {
                    self.mirror_excluding(Some(&agent)).await;
                }
                EventOutcome::Handled
            }
            InboundEvent::FocusChanged { agent } => {
                if self.registry.get(&agent).is_some() {
                    self.mirror_current().await;
                }
                EventOutcome::Handled
            }
            InboundEvent::AgentAttached { agent } => {
                log::debug!("Agent {agent} attached");
                if let Err(e) = self.bridge.player_added().await {
                    log::warn!("Failed to announce player: {e}");
                }
                EventOutcome::Handled
            }
            InboundEvent::RawInput { name, at } => {
                self.raw_input(&name, at).await;
                EventOutcome::Handled
            }
            InboundEvent::Command(command) => {
                self.route(&command).await;
                EventOutcome::Handled
            }
            InboundEvent::PeerCommand(peer) => self.peer_command(&peer).await,
            InboundEvent::SettingsChanged(settings) => self.apply_settings(&settings).await,
            InboundEvent::PeerDisconnected { generation } => {
                self.bridge.peer_lost(generation).await;
                EventOutcome::Handled
            }
            InboundEvent::Shutdown => {
                self.stop().await;
                EventOutcome::Handled
            }
        }
    }

    /// Route a command among the active agents
    pub async fn route(&mut self, command: &AgentCommand) -> RouteReport {
        // A targeted command never consults the directory
        let candidates = if command.target.is_some() {
            Vec::new()
        } else {
            match self.directory.active_agents().await {
                Ok(agents) => agents,
                Err(e) => {
                    log::warn!("Cannot list agents for {}: {e}", command.name);
                    return RouteReport::default();
                }
            }
        };

        self.router
            .route(command, &candidates, &self.registry, self.directory.as_ref())
    }

    /// Push the current player to the control peer
    ///
    /// Returns whether a message was sent.
    pub async fn mirror_current(&mut self) -> bool {
        self.mirror_excluding(None).await
    }

    async fn mirror_excluding(&mut self, excluded: Option<&AgentId>) -> bool {
        if !self.bridge.is_connected() {
            return false;
        }

        let agents: Vec<Agent> = match self.directory.active_agents().await {
            Ok(agents) => agents
                .into_iter()
                .filter(|agent| Some(&agent.id) != excluded)
                .collect(),
            Err(e) => {
                log::warn!("Cannot list agents for mirroring: {e}");
                return false;
            }
        };

        let selection = if agents.is_empty() {
            None
        } else {
            let selected = match self.selector.select_playing(&agents, &self.registry) {
                Ok(agent) => agent,
                Err(e) => {
                    log::debug!("Nothing to mirror: {e}");
                    return false;
                }
            };
            let Some(entry) = self.registry.get(&selected.id) else {
                log::debug!("Agent {} has not reported yet", selected.id);
                return false;
            };
            Some((&entry.agent, &entry.state))
        };

        match self.bridge.mirror(selection).await {
            Ok(sent) => sent,
            Err(e) => {
                log::warn!("Failed to mirror state: {e}");
                false
            }
        }
    }

    async fn report_state(&mut self, agent: AgentId, state: PlaybackState) {
        let previous = self.registry.upsert(agent.clone(), state);
        self.notify_track_change(&agent, previous.as_ref().map(|entry| &entry.state));
        self.mirror_current().await;
    }

    fn notify_track_change(&mut self, agent: &AgentId, previous: Option<&PlaybackState>) {
        let Some(entry) = self.registry.get(agent) else {
            return;
        };
        let state = &entry.state;

        let Some(song) = state.song_title() else {
            return;
        };
        if previous.and_then(PlaybackState::song_title) == Some(song) {
            return;
        }
        if !self.directory.notifications_enabled(agent) {
            return;
        }

        let Some(notification) = Notification::from_state(state) else {
            return;
        };
        let key = NotificationKey::for_agent(agent, state.site_name.as_deref());
        if let Err(e) = self.debouncer.show(key, &notification) {
            log::warn!("Failed to show notification for {agent}: {e}");
        }
    }

    pub(super) async fn raw_input(&mut self, name: &str, at: Instant) {
        match self.detector.on_input(name, at) {
            PressOutcome::Forward(command) | PressOutcome::PressStart(command) => {
                self.route(&command).await;
            }
            PressOutcome::Repeat => {}
        }
    }

    pub(super) async fn press_deadline(&mut self, now: Instant) {
        if let Some(command) = self.detector.on_deadline(now) {
            self.route(&command).await;
        }
    }

    async fn peer_command(&mut self, peer: &PeerCommand) -> EventOutcome {
        let Some(name) = peer.routed_command() else {
            log::warn!("Cannot handle native message: {}", peer.name());
            return EventOutcome::Unhandled(format!("Unrecognized peer command: {}", peer.name()));
        };

        log::debug!("Peer command {} -> {name}", peer.name());
        self.route(&AgentCommand::new(name)).await;
        EventOutcome::Handled
    }

    async fn apply_settings(&mut self, settings: &Settings) -> EventOutcome {
        self.options.apply(settings);
        self.router.set_single_agent_mode(self.options.single_agent_mode);

        match settings.use_mpris {
            Some(true) if !self.bridge_held => {
                if let Err(e) = self.hold_bridge().await {
                    return EventOutcome::Unhandled(e.to_string());
                }
            }
            Some(false) if self.bridge_held => {
                self.bridge_held = false;
                if let Err(e) = self.bridge.release().await {
                    log::warn!("Failed to close MPRIS bridge: {e}");
                }
            }
            _ => {}
        }

        EventOutcome::Handled
    }

    async fn hold_bridge(&mut self) -> crate::error::Result<()> {
        self.bridge.acquire().await?;
        self.bridge_held = true;
        self.mirror_current().await;
        Ok(())
    }

    pub(super) async fn stop(&mut self) {
        self.bridge_held = false;
        if let Err(e) = self.bridge.shutdown().await {
            log::warn!("Failed to close MPRIS bridge: {e}");
        }
    }
}
