//! Broadcast sequencer
//!
//! Plays a [`Script`] against a broadcast primitive: every event is handed to
//! the sink in declared order, followed by its delay. Waits are cooperative,
//! so a cancelled token stops the run at the next suspension point.
//!
//! ```text
//! Idle ──> Running(Once) ──> Completed
//!   └────> Running(Loop) ──> Running(Loop) ... ──> Cancelled
//! ```

pub mod trigger;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::BroadcastError;
use crate::types::{RunMode, Script};

pub use trigger::{ConnectTrigger, TriggerDecision};

/// Send-to-all primitive the sequencer plays into.
///
/// Implementations must not block for long: the sequencer calls this from
/// its own task between waits.
pub trait Broadcast: Send + Sync {
    /// Deliver `payload` to every connected client, returning how many
    /// receivers it reached
    fn broadcast(&self, payload: &str) -> Result<usize, BroadcastError>;
}

impl<T: Broadcast + ?Sized> Broadcast for std::sync::Arc<T> {
    fn broadcast(&self, payload: &str) -> Result<usize, BroadcastError> {
        (**self).broadcast(payload)
    }
}

/// Lifecycle of the single sequencer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "mode", rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Running(RunMode),
    Completed,
    Cancelled,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerState::Idle => write!(f, "idle"),
            SequencerState::Running(mode) => write!(f, "running ({mode})"),
            SequencerState::Completed => write!(f, "completed"),
            SequencerState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every event was emitted (run-once, or an empty script)
    Completed,
    /// The cancellation token fired before the script finished
    Cancelled,
    /// Another caller is already playing the script; nothing was emitted
    AlreadyRunning,
}

/// Exclusive right to play a sequencer's script, handed out once by
/// [`Sequencer::try_begin`]
#[must_use]
#[derive(Debug)]
pub(crate) struct RunPermit {
    _private: (),
}

/// Plays one script; the state field guards against double starts
pub struct Sequencer {
    script: Script,
    state: Mutex<SequencerState>,
    emitted: AtomicU64,
    passes: AtomicU64,
}

impl Sequencer {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: Mutex::new(SequencerState::Idle),
            emitted: AtomicU64::new(0),
            passes: AtomicU64::new(0),
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn state(&self) -> SequencerState {
        *self.state.lock()
    }

    /// Events handed to the sink so far, failed broadcasts included
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Passes started so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Move `Idle -> Running`. On any other state nothing changes and the
    /// observed state is returned.
    pub(crate) fn try_begin(&self) -> Result<RunPermit, SequencerState> {
        let mut state = self.state.lock();
        if *state != SequencerState::Idle {
            return Err(*state);
        }
        *state = SequencerState::Running(self.script.mode());
        Ok(RunPermit { _private: () })
    }

    /// Play the script with an entropy-seeded random source
    pub async fn run<B>(&self, sink: &B, cancel: &CancellationToken) -> SequenceOutcome
    where
        B: Broadcast + ?Sized,
    {
        let mut rng = StdRng::from_entropy();
        self.run_with_rng(sink, cancel, &mut rng).await
    }

    /// Play the script, drawing random delays from `rng`.
    ///
    /// Only the first call plays. A later call emits nothing: it returns
    /// `AlreadyRunning` while the first is in flight and the earlier outcome
    /// once that has finished.
    pub async fn run_with_rng<B, R>(
        &self,
        sink: &B,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> SequenceOutcome
    where
        B: Broadcast + ?Sized,
        R: Rng + Send + ?Sized,
    {
        match self.try_begin() {
            Ok(permit) => self.play(permit, sink, cancel, rng).await,
            Err(SequencerState::Completed) => SequenceOutcome::Completed,
            Err(SequencerState::Cancelled) => SequenceOutcome::Cancelled,
            Err(state) => {
                debug!(%state, "sequence already started");
                SequenceOutcome::AlreadyRunning
            }
        }
    }

    /// Play the script once `try_begin` has granted the run
    pub(crate) async fn play<B, R>(
        &self,
        _permit: RunPermit,
        sink: &B,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> SequenceOutcome
    where
        B: Broadcast + ?Sized,
        R: Rng + Send + ?Sized,
    {
        if self.script.is_empty() {
            debug!("empty script, nothing to play");
            return self.finish(SequenceOutcome::Completed);
        }

        let mode = self.script.mode();
        loop {
            let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(pass, events = self.script.len(), "starting pass");

            for event in self.script.events() {
                if cancel.is_cancelled() {
                    return self.finish(SequenceOutcome::Cancelled);
                }
                self.emit(sink, event.payload());

                let pacing = event.delay_after();
                let delay = pacing.resolve(rng);
                if pacing.is_random() {
                    info!(delay_ms = delay.as_millis() as u64, "sleeping random");
                }
                if !wait(delay, cancel).await {
                    return self.finish(SequenceOutcome::Cancelled);
                }
            }

            match mode {
                RunMode::Once => {
                    info!(emitted = self.emitted(), "sequence finished");
                    return self.finish(SequenceOutcome::Completed);
                }
                RunMode::Loop => {
                    let pause = self.script.inter_loop_delay();
                    info!(
                        pass,
                        restart_in_ms = pause.as_millis() as u64,
                        "pass finished, restarting"
                    );
                    if !wait(pause, cancel).await {
                        return self.finish(SequenceOutcome::Cancelled);
                    }
                }
            }
        }
    }

    fn emit<B>(&self, sink: &B, payload: &str)
    where
        B: Broadcast + ?Sized,
    {
        let seq = self.emitted.fetch_add(1, Ordering::SeqCst);
        match sink.broadcast(payload) {
            Ok(receivers) => debug!(seq, receivers, payload, "broadcast"),
            // No retry: the next event goes out on schedule
            Err(e) => warn!(seq, error = %e, "broadcast failed, continuing"),
        }
    }

    fn finish(&self, outcome: SequenceOutcome) -> SequenceOutcome {
        let mut state = self.state.lock();
        *state = match outcome {
            SequenceOutcome::Completed => SequencerState::Completed,
            SequenceOutcome::Cancelled => SequencerState::Cancelled,
        };
        if outcome == SequenceOutcome::Cancelled {
            info!("sequence cancelled");
        }
        outcome
    }
}

/// Sleep for `delay` unless cancelled first. Returns false on cancellation.
async fn wait(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
