//! # Media key arbitration for Rust
//!
//! Decides which of many concurrently playing media agents (browser tabs,
//! players, anything that reports playback state) receives a media-key
//! command, keeps an external MPRIS controller in sync with the current
//! player, debounces track-change notifications and tells short key presses
//! from held ones.
//!
//! ## Quick Start
//!
//! The host supplies three collaborators and feeds events to the engine:
//!
//! ```no_run
//! use std::sync::Arc;
//! use kodegen_media_keys::{Collaborators, Engine, EngineOptions};
//! use kodegen_media_keys::host::InMemoryDirectory;
//! # use kodegen_media_keys::host::{AgentDispatcher, NotificationPresenter};
//!
//! # async fn example(
//! #     dispatcher: Arc<dyn AgentDispatcher>,
//! #     presenter: Arc<dyn NotificationPresenter>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(InMemoryDirectory::new());
//! let options = EngineOptions::builder()
//!     .single_agent_mode(true)
//!     .use_bridge(true)
//!     .build();
//!
//! let collaborators = Collaborators::new(directory, dispatcher, presenter);
//! let (engine, handle) = Engine::with_native_host(options, collaborators);
//! tokio::spawn(engine.run());
//!
//! handle.raw_input("playNext")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Routing Rules
//!
//! - A command with an explicit target goes only to that agent.
//! - `mute`, `stop`, `playerStateNotify` and `getPlayerState` go to every
//!   agent.
//! - With single-agent mode off every command goes to every agent.
//! - With single-agent mode on, agents that are playing receive the command;
//!   if none is playing the [`SingleAgentSelector`] picks one.
//!
//! ## Architecture
//!
//! - [`types`]: Identifiers, playback state, commands, options
//! - [`registry`]: Last reported state per agent
//! - [`selector`]: Single agent selection
//! - [`router`]: Command routing and dispatch
//! - [`long_press`]: Press-and-hold detection
//! - [`notify`]: Notification expiry timers
//! - [`control`]: MPRIS bridge and its protocol
//! - [`transport`]: Native messaging host process transport
//! - [`manifest`]: Native messaging host manifests
//! - [`engine`]: The single-task engine tying it together
//! - [`host`]: Collaborator traits implemented by the embedding host
//! - [`error`]: Error types and handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, MediaKeysError>`](Result).
//! Routing never fails as a whole; per-agent dispatch failures are logged and
//! reported in a [`RouteReport`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod control;
pub mod engine;
pub mod error;
pub mod host;
pub mod long_press;
pub mod manifest;
pub mod notify;
pub mod registry;
pub mod router;
pub mod selector;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use control::{ExternalControlBridge, PeerCommand};
pub use engine::{Collaborators, Engine, EngineHandle, EventOutcome, InboundEvent};
pub use error::{MediaKeysError, Result};
pub use long_press::{LongPressDetector, PressOutcome, PressState};
pub use notify::NotificationDebouncer;
pub use registry::{AgentRegistry, UpdateTime};
pub use router::{CommandRouter, RouteReport};
pub use selector::SingleAgentSelector;
pub use transport::{NativeHostTransport, Transport};

// Re-export type submodules for flat public API
pub use types::agent::Agent;
pub use types::command::{AgentCommand, AgentMessage, CommandClass};
pub use types::identifiers::{AgentId, NotificationKey};
pub use types::notification::{Notification, NotificationItem};
pub use types::options::{EngineOptions, EngineOptionsBuilder, Settings};
pub use types::state::{PlaybackCapabilities, PlaybackState};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
