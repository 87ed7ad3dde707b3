//! Sequencer Integration Tests
//!
//! Tests for the sequencing properties against a recording sink:
//! - Run-once emission count and order
//! - Loop pass structure and random reveal windows
//! - Single start across many connections
//! - Resilience to failing broadcasts

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use broadcast_sequencer::script::shrinking_window;
use broadcast_sequencer::{
    Broadcast, BroadcastError, ConnectTrigger, Event, MessageSchema, RevealPacing, RunMode,
    Script, ScriptBuilder, SequenceOutcome, Sequencer, TriggerDecision,
};

/// Sink that records payloads with their arrival time and can stop the run
/// after a number of calls
struct RecordingSink {
    calls: Mutex<Vec<(String, Instant)>>,
    stop_after: Option<(usize, CancellationToken)>,
    fail: bool,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            stop_after: None,
            fail: false,
        }
    }

    fn stopping_after(count: usize, cancel: CancellationToken) -> Self {
        Self {
            stop_after: Some((count, cancel)),
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn payloads(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl Broadcast for RecordingSink {
    fn broadcast(&self, payload: &str) -> Result<usize, BroadcastError> {
        let count = {
            let mut calls = self.calls.lock();
            calls.push((payload.to_string(), Instant::now()));
            calls.len()
        };
        if let Some((limit, cancel)) = &self.stop_after {
            if count >= *limit {
                cancel.cancel();
            }
        }
        if self.fail {
            Err(BroadcastError::NoClients)
        } else {
            Ok(1)
        }
    }
}

/// Kind of a tagged-schema payload
fn kind(payload: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(v) => v["type"].as_str().unwrap_or("other").to_string(),
        Err(_) if payload.starts_with("Finished loop") => "finished".to_string(),
        Err(_) => "text".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_once_emits_exactly_n_events_in_order() {
    for n in 1..=8usize {
        let events: Vec<Event> = (0..n).map(|i| Event::new(format!("event-{i}"), 100)).collect();
        let sink = RecordingSink::new();

        let outcome = Sequencer::new(Script::once(events))
            .run(&sink, &CancellationToken::new())
            .await;

        assert_eq!(outcome, SequenceOutcome::Completed);
        let expected: Vec<String> = (0..n).map(|i| format!("event-{i}")).collect();
        assert_eq!(sink.payloads(), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_example_scenario() {
    let script = Script::once(vec![
        Event::new("series1", 500),
        Event::new("marker:1", 500),
        Event::new("reveal:0.1", 0),
    ]);
    let sink = Arc::new(RecordingSink::new());
    let shutdown = CancellationToken::new();
    let trigger = ConnectTrigger::new(
        Arc::new(Sequencer::new(script)),
        sink.clone(),
        "joined".to_string(),
        shutdown.clone(),
    );

    assert_eq!(trigger.on_client_connected("client-1"), TriggerDecision::Started);
    assert_eq!(trigger.join().await, Some(SequenceOutcome::Completed));

    assert_eq!(
        sink.payloads(),
        vec!["joined", "series1", "marker:1", "reveal:0.1"]
    );
    assert!(shutdown.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_loop_passes_repeat_the_same_kinds() {
    let script = ScriptBuilder::new(RunMode::Loop)
        .schema(MessageSchema::Tagged)
        .series_count(2)
        .reveal_pacing(RevealPacing::Shrinking)
        .inter_loop_delay(Duration::from_secs(2))
        .build()
        .unwrap();
    let pass_len = script.len();
    let cancel = CancellationToken::new();
    let sink = RecordingSink::stopping_after(pass_len * 3, cancel.clone());
    let mut rng = StdRng::seed_from_u64(2024);

    let sequencer = Sequencer::new(script);
    let outcome = sequencer.run_with_rng(&sink, &cancel, &mut rng).await;

    assert_eq!(outcome, SequenceOutcome::Cancelled);
    assert_eq!(sequencer.passes(), 3);

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), pass_len * 3);

    let mut expected_series = vec!["series".to_string()];
    for _ in 1..=10 {
        expected_series.push("marker".to_string());
        expected_series.push("reveal".to_string());
    }
    expected_series.push("finished".to_string());

    for pass in payloads.chunks(pass_len) {
        let kinds: Vec<String> = pass.iter().map(|p| kind(p)).collect();
        for series in kinds.chunks(expected_series.len()) {
            assert_eq!(series, expected_series.as_slice());
        }
        // passes carry identical payloads
        assert_eq!(pass, &payloads[..pass_len]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_random_reveal_delays_fall_in_shrinking_window() {
    let script = ScriptBuilder::new(RunMode::Once)
        .schema(MessageSchema::Tagged)
        .build()
        .unwrap();
    assert_eq!(script.len(), 3);

    // A loop pass exercises every marker from 1 to 10
    let script = ScriptBuilder::new(RunMode::Loop)
        .schema(MessageSchema::Tagged)
        .reveal_pacing(RevealPacing::Shrinking)
        .build()
        .unwrap();
    let pass_len = script.len();
    let cancel = CancellationToken::new();
    let sink = RecordingSink::stopping_after(pass_len, cancel.clone());
    let mut rng = StdRng::seed_from_u64(7);

    Sequencer::new(script)
        .run_with_rng(&sink, &cancel, &mut rng)
        .await;

    let calls = sink.calls.lock();
    for j in 1..=10u32 {
        let marker_at = calls[(2 * j - 1) as usize].1;
        let reveal_at = calls[(2 * j) as usize].1;
        let gap = reveal_at - marker_at;
        let (low, high) = shrinking_window(j);

        assert_eq!(high, 12 - u64::from(j));
        assert!(gap >= Duration::from_secs(low), "marker {j}: {gap:?}");
        assert!(
            gap <= Duration::from_secs(high) + Duration::from_millis(5),
            "marker {j}: {gap:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_many_connects_start_exactly_one_run() {
    let script = Script::looping(vec![Event::new("tick", 250)], Duration::from_millis(250));
    let sink = Arc::new(RecordingSink::new());
    let shutdown = CancellationToken::new();
    let trigger = ConnectTrigger::new(
        Arc::new(Sequencer::new(script)),
        sink.clone(),
        "joined".to_string(),
        shutdown.clone(),
    );

    let mut started = 0;
    for m in 0..20 {
        if trigger.on_client_connected(&format!("client-{m}")) == TriggerDecision::Started {
            started += 1;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(started, 1);

    // 1s elapsed; one pass is 500ms, so a single run has produced two passes
    shutdown.cancel();
    assert_eq!(trigger.join().await, Some(SequenceOutcome::Cancelled));
    let ticks = sink.payloads().iter().filter(|p| *p == "tick").count();
    assert_eq!(ticks as u64, trigger.sequencer().passes());
    assert!(ticks <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_client_transport_does_not_stop_the_sequence() {
    let script = ScriptBuilder::new(RunMode::Once).build().unwrap();
    let sink = RecordingSink::failing();

    let start = Instant::now();
    let outcome = Sequencer::new(script)
        .run(&sink, &CancellationToken::new())
        .await;

    assert_eq!(outcome, SequenceOutcome::Completed);
    assert_eq!(
        sink.payloads(),
        vec![r#"{"series":"series1"}"#, r#"{"marker":1}"#, r#"{"reveal":0.1}"#]
    );

    let calls = sink.calls.lock();
    assert!(calls[1].1 - start >= Duration::from_millis(500));
    assert!(calls[2].1 - start >= Duration::from_millis(1_000));
}
