//! Engine options and runtime settings
//!
//! `EngineOptions` fixes the timing constants and startup behaviour. `Settings`
//! mirrors the keys the settings store pushes at runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::command::PLAY_PAUSE;

// ============================================================================
// Defaults
// ============================================================================

/// Reports this close to the newest one count as equally current
pub const DEFAULT_SELECTION_WINDOW: Duration = Duration::from_millis(200);

/// Max gap between repeated raw inputs for them to count as a held key
pub const DEFAULT_LONG_PRESS_GAP: Duration = Duration::from_millis(50);

/// Quiet period after the last repeat that ends a held key
pub const DEFAULT_LONG_PRESS_END: Duration = Duration::from_millis(500);

/// How long a track-change notification stays up
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

/// Default maximum native messaging frame (1MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

// ============================================================================
// Engine Options
// ============================================================================

/// Main options for the media-key engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Route routable commands to one agent instead of all
    pub single_agent_mode: bool,
    /// Mirror state to the MPRIS bridge at startup
    pub use_bridge: bool,
    /// Tolerance window for "equally current" reports
    pub selection_window: Duration,
    /// Command eligible for press-and-hold detection
    pub long_press_command: String,
    /// Max gap between repeats of a held key
    pub long_press_gap: Duration,
    /// Quiet period that ends a held key
    pub long_press_end: Duration,
    /// Notification lifetime
    pub notification_ttl: Duration,
    /// Path to the native messaging host (searched when `None`)
    pub host_path: Option<PathBuf>,
    /// Maximum native messaging frame size
    pub max_frame_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            single_agent_mode: false,
            use_bridge: false,
            selection_window: DEFAULT_SELECTION_WINDOW,
            long_press_command: PLAY_PAUSE.to_string(),
            long_press_gap: DEFAULT_LONG_PRESS_GAP,
            long_press_end: DEFAULT_LONG_PRESS_END,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            host_path: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl EngineOptions {
    /// Create a new builder for `EngineOptions`
    #[must_use]
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    /// Apply runtime settings on top of these options
    pub fn apply(&mut self, settings: &Settings) {
        if let Some(single) = settings.single_player_mode {
            self.single_agent_mode = single;
        }
        if let Some(mpris) = settings.use_mpris {
            self.use_bridge = mpris;
        }
    }
}

// ============================================================================
// Builder for EngineOptions
// ============================================================================

/// Builder for `EngineOptions`
#[derive(Debug, Default)]
pub struct EngineOptionsBuilder {
    options: EngineOptions,
}

impl EngineOptionsBuilder {
    /// Enable or disable single-agent routing
    #[must_use]
    pub const fn single_agent_mode(mut self, enabled: bool) -> Self {
        self.options.single_agent_mode = enabled;
        self
    }

    /// Open the MPRIS bridge at startup
    #[must_use]
    pub const fn use_bridge(mut self, enabled: bool) -> Self {
        self.options.use_bridge = enabled;
        self
    }

    /// Set the selection tolerance window
    #[must_use]
    pub const fn selection_window(mut self, window: Duration) -> Self {
        self.options.selection_window = window;
        self
    }

    /// Set the command eligible for press-and-hold
    #[must_use]
    pub fn long_press_command(mut self, name: impl Into<String>) -> Self {
        self.options.long_press_command = name.into();
        self
    }

    /// Set the press-and-hold thresholds
    #[must_use]
    pub const fn long_press_timing(mut self, gap: Duration, end: Duration) -> Self {
        self.options.long_press_gap = gap;
        self.options.long_press_end = end;
        self
    }

    /// Set the notification lifetime
    #[must_use]
    pub const fn notification_ttl(mut self, ttl: Duration) -> Self {
        self.options.notification_ttl = ttl;
        self
    }

    /// Set the native messaging host path
    #[must_use]
    pub fn host_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.host_path = Some(path.into());
        self
    }

    /// Set the maximum native messaging frame size
    ///
    /// # Panics
    /// Panics if size is zero
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        assert!(size > 0, "max_frame_size must be non-zero");
        self.options.max_frame_size = size;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> EngineOptions {
        self.options
    }
}

// ============================================================================
// Runtime settings
// ============================================================================

/// Settings pushed by the settings store
///
/// Only keys present in the update are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `hotkey-single_player_mode`
    #[serde(
        default,
        rename = "hotkey-single_player_mode",
        skip_serializing_if = "Option::is_none"
    )]
    pub single_player_mode: Option<bool>,
    /// `hotkey-use_mpris`
    #[serde(
        default,
        rename = "hotkey-use_mpris",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_mpris: Option<bool>,
}
