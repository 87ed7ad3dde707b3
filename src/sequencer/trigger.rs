//! Connect-driven trigger
//!
//! Every new client gets a join notice broadcast. Only the first connection
//! starts the sequencer; later ones never restart or queue another run.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Broadcast, SequenceOutcome, Sequencer};
use crate::types::RunMode;

/// What a connect event did to the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// This connection started the sequence
    Started,
    /// The sequence was already started by an earlier connection
    AlreadyStarted,
}

/// Starts the sequencer on the first client connection
pub struct ConnectTrigger {
    sequencer: Arc<Sequencer>,
    sink: Arc<dyn Broadcast>,
    joined_notice: String,
    /// Cancelled when a run-once sequence completes
    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<SequenceOutcome>>>,
}

impl ConnectTrigger {
    pub fn new(
        sequencer: Arc<Sequencer>,
        sink: Arc<dyn Broadcast>,
        joined_notice: String,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sequencer,
            sink,
            joined_notice,
            shutdown,
            handle: Mutex::new(None),
        }
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    /// Handle a new client: announce it, then start the sequence if this is
    /// the first connection
    pub fn on_client_connected(&self, client_id: &str) -> TriggerDecision {
        if let Err(e) = self.sink.broadcast(&self.joined_notice) {
            warn!(client_id, error = %e, "join notice not delivered");
        }

        let permit = match self.sequencer.try_begin() {
            Ok(permit) => permit,
            Err(state) => {
                debug!(client_id, %state, "sequence already started");
                return TriggerDecision::AlreadyStarted;
            }
        };

        let mode = self.sequencer.script().mode();
        match mode {
            RunMode::Once => info!(client_id, "going to run once"),
            RunMode::Loop => info!(
                client_id,
                delay_ms = self.sequencer.script().inter_loop_delay().as_millis() as u64,
                "going to run in a loop, Ctrl+C to exit"
            ),
        }

        let sequencer = Arc::clone(&self.sequencer);
        let sink = Arc::clone(&self.sink);
        let shutdown = self.shutdown.clone();
        let cancel = self.shutdown.child_token();

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let outcome = sequencer.play(permit, &*sink, &cancel, &mut rng).await;
            if outcome == SequenceOutcome::Completed && mode == RunMode::Once {
                info!("run-once sequence complete, shutting down");
                shutdown.cancel();
            }
            outcome
        });
        *self.handle.lock() = Some(handle);

        TriggerDecision::Started
    }

    /// Log a departing client; the sequence keeps running
    pub fn on_client_left(&self, client_id: &str) {
        info!(client_id, "client has left, server will continue");
    }

    /// Wait for the running sequence, if one was started
    pub async fn join(&self) -> Option<SequenceOutcome> {
        let handle = self.handle.lock().take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "sequencer task failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BroadcastError;
    use crate::types::{Event, Script};
    use std::time::Duration;

    #[derive(Default)]
    struct Counter {
        payloads: Mutex<Vec<String>>,
    }

    impl Broadcast for Counter {
        fn broadcast(&self, payload: &str) -> Result<usize, BroadcastError> {
            self.payloads.lock().push(payload.to_string());
            Ok(1)
        }
    }

    fn trigger_for(script: Script) -> (ConnectTrigger, Arc<Counter>, CancellationToken) {
        let sink = Arc::new(Counter::default());
        let shutdown = CancellationToken::new();
        let trigger = ConnectTrigger::new(
            Arc::new(Sequencer::new(script)),
            sink.clone(),
            "joined".to_string(),
            shutdown.clone(),
        );
        (trigger, sink, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_connects_start_one_run() {
        let (trigger, sink, shutdown) = trigger_for(Script::once(vec![
            Event::new("series1", 500),
            Event::new("marker:1", 500),
            Event::new("reveal:0.1", 0),
        ]));

        let decisions: Vec<TriggerDecision> = (0..5)
            .map(|i| trigger.on_client_connected(&format!("client-{i}")))
            .collect();

        assert_eq!(decisions[0], TriggerDecision::Started);
        assert!(decisions[1..]
            .iter()
            .all(|d| *d == TriggerDecision::AlreadyStarted));

        assert_eq!(trigger.join().await, Some(SequenceOutcome::Completed));
        assert_eq!(trigger.sequencer().passes(), 1);

        let payloads = sink.payloads.lock().clone();
        let joined = payloads.iter().filter(|p| *p == "joined").count();
        let scripted: Vec<&String> = payloads.iter().filter(|p| *p != "joined").collect();
        assert_eq!(joined, 5);
        assert_eq!(scripted, vec!["series1", "marker:1", "reveal:0.1"]);

        // run-once completion shuts the server down
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_run_stops_on_shutdown() {
        let (trigger, _sink, shutdown) = trigger_for(Script::looping(
            vec![Event::new("tick", 100)],
            Duration::from_millis(100),
        ));

        assert_eq!(trigger.on_client_connected("a"), TriggerDecision::Started);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(!shutdown.is_cancelled());

        shutdown.cancel();
        assert_eq!(trigger.join().await, Some(SequenceOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_join_without_start_is_none() {
        let (trigger, _sink, _shutdown) = trigger_for(Script::once(vec![]));
        assert_eq!(trigger.join().await, None);
    }
}
