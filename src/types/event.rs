//! Timed broadcast events
//!
//! An event is one opaque payload plus the pacing to apply after it has been
//! sent. Events are immutable once constructed.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long the sequencer waits after emitting an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pacing {
    /// Always wait exactly this many milliseconds
    Fixed { ms: u64 },

    /// Wait a uniformly drawn number of milliseconds in `[min_ms, max_ms]`
    Uniform { min_ms: u64, max_ms: u64 },
}

impl Pacing {
    /// Fixed pacing in milliseconds
    pub const fn fixed(ms: u64) -> Self {
        Pacing::Fixed { ms }
    }

    /// No wait at all
    pub const fn none() -> Self {
        Pacing::Fixed { ms: 0 }
    }

    /// Uniform pacing over an inclusive millisecond range.
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn uniform(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Pacing::Uniform { min_ms, max_ms }
        } else {
            Pacing::Uniform {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// Shortest delay this pacing can produce
    pub fn min(&self) -> Duration {
        match *self {
            Pacing::Fixed { ms } => Duration::from_millis(ms),
            Pacing::Uniform { min_ms, .. } => Duration::from_millis(min_ms),
        }
    }

    /// Whether the delay is drawn at random on each emission
    pub fn is_random(&self) -> bool {
        matches!(self, Pacing::Uniform { min_ms, max_ms } if min_ms != max_ms)
    }

    /// Resolve the concrete delay for one emission
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Pacing::Fixed { ms } => Duration::from_millis(ms),
            Pacing::Uniform { min_ms, max_ms } => {
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::none()
    }
}

/// One message payload plus the delay to wait after sending it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    payload: String,
    delay_after: Pacing,
}

impl Event {
    /// Create an event followed by a fixed delay
    pub fn new(payload: impl Into<String>, delay_after_ms: u64) -> Self {
        Self {
            payload: payload.into(),
            delay_after: Pacing::fixed(delay_after_ms),
        }
    }

    /// Create an event followed by an arbitrary pacing
    pub fn with_pacing(payload: impl Into<String>, delay_after: Pacing) -> Self {
        Self {
            payload: payload.into(),
            delay_after,
        }
    }

    /// The message body, opaque to the sequencer
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Pacing applied after this event
    pub fn delay_after(&self) -> Pacing {
        self.delay_after
    }
}
