//! The arbitration engine
//!
//! One task owns the registry, router, press detector, notification timers
//! and the control bridge. Everything that changes them arrives as an
//! [`InboundEvent`] and is handled to completion before the next one.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   InboundEvent   ┌──────────────────────────────┐
//! │ EngineHandle  │ ───────────────→ │            Engine            │
//! │ (host, stdin) │                  │                              │
//! └───────────────┘                  │  registry   router  detector │
//! ┌───────────────┐   PeerCommand    │  debouncer  bridge           │
//! │ bridge reader │ ───────────────→ │                              │
//! └───────────────┘                  │  select! { events, press     │
//!                                    │            deadline, expiry }│
//!                                    └──────────────┬───────────────┘
//!                                                   │
//!                        AgentDispatcher / NotificationPresenter / peer
//! ```
//!
//! Press-end and notification-expiry timers are `select!` arms of the same
//! loop, so a timer that was rescheduled or cancelled can never run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kodegen_media_keys::engine::{Collaborators, Engine, InboundEvent};
//! use kodegen_media_keys::host::InMemoryDirectory;
//! use kodegen_media_keys::types::{Agent, EngineOptions, PlaybackState};
//! # use kodegen_media_keys::host::{AgentDispatcher, NotificationPresenter};
//!
//! # async fn example(
//! #     dispatcher: Arc<dyn AgentDispatcher>,
//! #     presenter: Arc<dyn NotificationPresenter>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::with_agents(vec![Agent::new("1")]);
//! let collaborators = Collaborators::new(Arc::new(directory), dispatcher, presenter);
//!
//! let (engine, handle) = Engine::with_native_host(EngineOptions::default(), collaborators);
//! let task = tokio::spawn(engine.run());
//!
//! handle.send(InboundEvent::ReportState {
//!     agent: "1".into(),
//!     state: PlaybackState::track("Song", true),
//! })?;
//! handle.raw_input("playPause")?;
//!
//! handle.shutdown()?;
//! task.await?;
//! # Ok(())
//! # }
//! ```

mod engine_impl;
mod events;
mod tasks;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::control::ExternalControlBridge;
use crate::host::{AgentDirectory, AgentDispatcher, NotificationPresenter};
use crate::long_press::LongPressDetector;
use crate::notify::NotificationDebouncer;
use crate::registry::AgentRegistry;
use crate::router::CommandRouter;
use crate::selector::SingleAgentSelector;
use crate::transport::Transport;
use crate::types::options::EngineOptions;

pub use events::{EngineHandle, EventOutcome, InboundEvent};

/// Host-provided collaborators
#[derive(Clone)]
pub struct Collaborators {
    /// Source of active agents and per-agent flags
    pub directory: Arc<dyn AgentDirectory>,
    /// Delivers commands to agents
    pub dispatcher: Arc<dyn AgentDispatcher>,
    /// Shows and clears notifications
    pub presenter: Arc<dyn NotificationPresenter>,
}

impl Collaborators {
    /// Bundle the three collaborators
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        dispatcher: Arc<dyn AgentDispatcher>,
        presenter: Arc<dyn NotificationPresenter>,
    ) -> Self {
        Self {
            directory,
            dispatcher,
            presenter,
        }
    }
}

/// Single-context command arbitration engine
///
/// Generic over the transport used to reach the control peer so tests can
/// substitute an in-process peer.
pub struct Engine<T: Transport> {
    /// Current options, updated by settings changes
    options: EngineOptions,
    /// Last reported state per agent
    registry: AgentRegistry,
    /// Selector used for state mirroring
    selector: SingleAgentSelector,
    /// Command routing
    router: CommandRouter,
    /// Press-and-hold detection for raw input
    detector: LongPressDetector,
    /// Notification expiry timers
    debouncer: NotificationDebouncer,
    /// Connection to the control peer
    bridge: ExternalControlBridge<T>,
    /// Whether the engine holds a bridge reference for the `use_mpris` setting
    bridge_held: bool,
    /// Active agents and per-agent flags
    directory: Arc<dyn AgentDirectory>,
    /// Event source
    events: mpsc::UnboundedReceiver<InboundEvent>,
}
