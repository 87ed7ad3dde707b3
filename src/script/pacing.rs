//! Reveal pacing policies
//!
//! Controls how long the sequencer waits between a marker and its reveal.

use serde::{Deserialize, Serialize};

use crate::types::Pacing;

/// Upper bound of the random window is `SHRINKING_WINDOW_CEILING_SECS - j`
pub const SHRINKING_WINDOW_CEILING_SECS: u64 = 12;

/// Lower bound of the random window, in seconds
pub const SHRINKING_WINDOW_FLOOR_SECS: u64 = 1;

/// Default fixed gap between a marker and its reveal
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 500;

/// Delay policy applied between marker `j` and its reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPacing {
    /// Same delay for every marker
    Fixed { ms: u64 },

    /// Uniform random delay in `[1, 12 - j]` seconds, so later reveals
    /// come faster
    Shrinking,
}

impl RevealPacing {
    /// Pacing for the event emitted right after marker `j` (1-based)
    pub fn for_marker(&self, marker: u32) -> Pacing {
        match *self {
            RevealPacing::Fixed { ms } => Pacing::fixed(ms),
            RevealPacing::Shrinking => {
                let (low, high) = shrinking_window(marker);
                Pacing::uniform(low * 1_000, high * 1_000)
            }
        }
    }
}

impl Default for RevealPacing {
    fn default() -> Self {
        RevealPacing::Fixed {
            ms: DEFAULT_REVEAL_DELAY_MS,
        }
    }
}

/// Inclusive window, in whole seconds, for the random delay after marker `j`.
///
/// The upper bound never drops below the floor, so markers past the tenth
/// get a fixed one-second delay.
pub fn shrinking_window(marker: u32) -> (u64, u64) {
    let high = SHRINKING_WINDOW_CEILING_SECS
        .saturating_sub(u64::from(marker))
        .max(SHRINKING_WINDOW_FLOOR_SECS);
    (SHRINKING_WINDOW_FLOOR_SECS, high)
}
