//! Built-in scripts
//!
//! Produces the run-once and loop scripts from a handful of settings, so both
//! message schemas share one code path.

use std::time::Duration;

use super::pacing::RevealPacing;
use super::schema::{Message, MessageSchema};
use crate::types::{Event, Pacing, RunMode, Script};

/// Gap after a series start and after each reveal
pub const DEFAULT_STEP_GAP_MS: u64 = 500;

/// Markers emitted per series
pub const DEFAULT_MARKERS_PER_SERIES: u32 = 10;

/// Pause after a full tagged pass, independent of `--delay`
pub const TAGGED_PASS_TAIL: Duration = Duration::from_secs(2);

/// Waits around the events of one loop pass
#[derive(Debug, Clone, Copy)]
struct PassTiming {
    after_series_ms: u64,
    /// Pause before each marker, after the series wait
    before_marker_ms: u64,
    /// Pause after a "loop finished" notice when another series follows
    between_series_ms: u64,
    /// Script inter-loop delay
    pass_tail: Duration,
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for the built-in status scripts
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    mode: RunMode,
    schema: MessageSchema,
    series_count: u32,
    markers_per_series: u32,
    reveal_pacing: RevealPacing,
    step_gap_ms: u64,
    inter_loop_delay: Duration,
}

impl ScriptBuilder {
    /// Builder with the defaults for a given mode
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            schema: MessageSchema::default(),
            series_count: 1,
            markers_per_series: DEFAULT_MARKERS_PER_SERIES,
            reveal_pacing: RevealPacing::default(),
            step_gap_ms: DEFAULT_STEP_GAP_MS,
            inter_loop_delay: Duration::from_secs(1),
        }
    }

    pub fn schema(mut self, schema: MessageSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Number of series per loop pass (at least one)
    pub fn series_count(mut self, count: u32) -> Self {
        self.series_count = count.max(1);
        self
    }

    pub fn markers_per_series(mut self, count: u32) -> Self {
        self.markers_per_series = count;
        self
    }

    pub fn reveal_pacing(mut self, pacing: RevealPacing) -> Self {
        self.reveal_pacing = pacing;
        self
    }

    pub fn step_gap_ms(mut self, ms: u64) -> Self {
        self.step_gap_ms = ms;
        self
    }

    pub fn inter_loop_delay(mut self, delay: Duration) -> Self {
        self.inter_loop_delay = delay;
        self
    }

    /// Render the script for the configured mode
    pub fn build(&self) -> Result<Script, serde_json::Error> {
        match self.mode {
            RunMode::Once => Ok(Script::once(self.once_events()?)),
            RunMode::Loop => {
                let timing = self.pass_timing();
                Ok(Script::looping(
                    self.loop_pass_events(&timing)?,
                    timing.pass_tail,
                ))
            }
        }
    }

    /// series 1, marker 1, reveal 1
    fn once_events(&self) -> Result<Vec<Event>, serde_json::Error> {
        let gap = Pacing::fixed(self.step_gap_ms);
        Ok(vec![
            self.event(Message::Series(1), gap)?,
            self.event(Message::Marker(1), gap)?,
            self.event(Message::Reveal(1), Pacing::none())?,
        ])
    }

    /// Loop waits as each schema's clients expect them
    fn pass_timing(&self) -> PassTiming {
        let loop_delay_ms = millis(self.inter_loop_delay);
        match self.schema {
            MessageSchema::Flat => PassTiming {
                after_series_ms: self.step_gap_ms,
                before_marker_ms: 0,
                between_series_ms: loop_delay_ms,
                pass_tail: self.inter_loop_delay,
            },
            MessageSchema::Tagged => PassTiming {
                after_series_ms: loop_delay_ms.saturating_add(self.step_gap_ms),
                before_marker_ms: self.step_gap_ms,
                between_series_ms: 0,
                pass_tail: TAGGED_PASS_TAIL,
            },
        }
    }

    fn loop_pass_events(&self, timing: &PassTiming) -> Result<Vec<Event>, serde_json::Error> {
        let per_series = 2 + 2 * self.markers_per_series as usize;
        let mut events = Vec::with_capacity(per_series * self.series_count as usize);

        for series in 1..=self.series_count {
            events.push(self.event(
                Message::SeriesStart(series),
                Pacing::fixed(timing.after_series_ms),
            )?);
            for marker in 1..=self.markers_per_series {
                events.push(self.event(
                    Message::Marker(marker),
                    self.reveal_pacing.for_marker(marker),
                )?);
                // the wait before the next marker folds into this reveal's delay
                let after_reveal = if marker < self.markers_per_series {
                    self.step_gap_ms.saturating_add(timing.before_marker_ms)
                } else {
                    self.step_gap_ms
                };
                events.push(self.event(Message::Reveal(marker), Pacing::fixed(after_reveal))?);
            }
            // the last series is followed by the pass tail instead
            let after_finished = if series < self.series_count {
                timing.between_series_ms
            } else {
                0
            };
            events.push(self.event(
                Message::LoopFinished(self.inter_loop_delay),
                Pacing::fixed(after_finished),
            )?);
        }

        Ok(events)
    }

    fn event(&self, message: Message, pacing: Pacing) -> Result<Event, serde_json::Error> {
        Ok(Event::with_pacing(self.schema.render(&message)?, pacing))
    }
}
