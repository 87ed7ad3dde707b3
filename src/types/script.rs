//! Event scripts

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Event;

/// Whether a script plays once or loops until cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Play every event once, then signal termination
    Once,
    /// Replay the script forever, pausing between passes
    Loop,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Once => write!(f, "once"),
            RunMode::Loop => write!(f, "loop"),
        }
    }
}

/// Ordered sequence of timed events plus how to play them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    events: Vec<Event>,
    mode: RunMode,
    inter_loop_delay: Duration,
}

impl Script {
    /// Script that plays once
    pub fn once(events: Vec<Event>) -> Self {
        Self {
            events,
            mode: RunMode::Once,
            inter_loop_delay: Duration::ZERO,
        }
    }

    /// Script that loops forever with a pause between passes
    pub fn looping(events: Vec<Event>, inter_loop_delay: Duration) -> Self {
        Self {
            events,
            mode: RunMode::Loop,
            inter_loop_delay,
        }
    }

    /// Build a script for an explicit mode
    pub fn new(events: Vec<Event>, mode: RunMode, inter_loop_delay: Duration) -> Self {
        match mode {
            RunMode::Once => Self::once(events),
            RunMode::Loop => Self::looping(events, inter_loop_delay),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Pause before restarting in loop mode (zero in once mode)
    pub fn inter_loop_delay(&self) -> Duration {
        self.inter_loop_delay
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Shortest possible duration of one pass, excluding the inter-loop delay
    pub fn min_pass_duration(&self) -> Duration {
        self.events.iter().map(|e| e.delay_after().min()).sum()
    }
}
