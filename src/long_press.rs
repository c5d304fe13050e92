//! Press-and-hold detection for raw key input
//!
//! Some keyboards repeat a media key every few milliseconds while it is held.
//! Repeats of the eligible command that arrive faster than the gap threshold
//! become a single press-start, and the press ends once the repeats stop for
//! the end period. The detector holds one deadline; the owner waits on it and
//! calls [`LongPressDetector::on_deadline`] when it passes.

use std::time::Duration;
use tokio::time::Instant;

use crate::types::command::{AgentCommand, PLAYBACK_RATE};
use crate::types::options::EngineOptions;

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    /// No key held
    Idle,
    /// Key held, waiting for repeats to stop
    Pressing,
}

/// What a raw input turned into
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// Normal press, route the command as-is
    Forward(AgentCommand),
    /// Hold began, route the press-start command
    PressStart(AgentCommand),
    /// Repeat of a held key, nothing to route
    Repeat,
}

/// Reclassifies rapid repeats into press-start/press-end
#[derive(Debug)]
pub struct LongPressDetector {
    eligible: String,
    gap: Duration,
    end_after: Duration,
    state: PressState,
    last_input: Option<Instant>,
    deadline: Option<Instant>,
}

impl LongPressDetector {
    /// Create a detector for `eligible` with the given thresholds
    pub fn new(eligible: impl Into<String>, gap: Duration, end_after: Duration) -> Self {
        Self {
            eligible: eligible.into(),
            gap,
            end_after,
            state: PressState::Idle,
            last_input: None,
            deadline: None,
        }
    }

    /// Create a detector from engine options
    #[must_use]
    pub fn from_options(options: &EngineOptions) -> Self {
        Self::new(
            options.long_press_command.clone(),
            options.long_press_gap,
            options.long_press_end,
        )
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> PressState {
        self.state
    }

    /// Pending end-of-press deadline
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Classify a raw input that arrived at `now`
    pub fn on_input(&mut self, name: &str, now: Instant) -> PressOutcome {
        let gap = self.last_input.map(|last| now.saturating_duration_since(last));
        self.last_input = Some(now);

        let rapid = gap.is_some_and(|gap| gap < self.gap);
        if !(rapid && name == self.eligible) {
            log::debug!("Standard press: {name}");
            return PressOutcome::Forward(AgentCommand::new(name));
        }

        // Each qualifying repeat pushes the end out again
        self.deadline = Some(now + self.end_after);

        match self.state {
            PressState::Idle => {
                log::debug!("Long press started: {name}");
                self.state = PressState::Pressing;
                PressOutcome::PressStart(press_start())
            }
            PressState::Pressing => PressOutcome::Repeat,
        }
    }

    /// Handle the deadline passing at `now`
    ///
    /// Returns the press-end command if the hold actually ended. A call for a
    /// deadline that has since moved, or while idle, returns `None`.
    pub fn on_deadline(&mut self, now: Instant) -> Option<AgentCommand> {
        let deadline = self.deadline?;
        if now < deadline || self.state != PressState::Pressing {
            return None;
        }

        log::debug!("Long press ended");
        self.deadline = None;
        self.state = PressState::Idle;
        Some(press_end())
    }
}

/// Command sent when a hold begins
#[must_use]
pub fn press_start() -> AgentCommand {
    AgentCommand::new(PLAYBACK_RATE).arg(2)
}

/// Command sent when a hold ends
#[must_use]
pub fn press_end() -> AgentCommand {
    AgentCommand::new(PLAYBACK_RATE).arg(1)
}
