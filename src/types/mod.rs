//! Type definitions for the media-key engine
//!
//! - [`identifiers`] - Type-safe ID wrappers (`AgentId`, `NotificationKey`)
//! - [`agent`] - Agent descriptors from the directory
//! - [`state`] - Reported playback state and capability flags
//! - [`command`] - Commands, routing classes and agent messages
//! - [`notification`] - Track-change notification payloads
//! - [`options`] - Engine options and runtime settings

pub mod agent;
pub mod command;
pub mod identifiers;
pub mod notification;
pub mod options;
pub mod state;

// Re-export commonly used types
pub use agent::Agent;
pub use command::{AgentCommand, AgentMessage, CommandClass};
pub use identifiers::{AgentId, NotificationKey};
pub use notification::{Notification, NotificationItem};
pub use options::{EngineOptions, EngineOptionsBuilder, Settings};
pub use state::{PlaybackCapabilities, PlaybackState, parse_clock};
